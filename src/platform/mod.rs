//! Video platform API client and related functionality

pub mod cipher;
pub mod client;
pub mod formats;
pub mod player_response;

pub use cipher::*;
pub use client::*;
pub use formats::*;
pub use player_response::{decode, DecodedResponse, PlayerResponse};
