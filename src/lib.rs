pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod input;
pub mod logging;
pub mod request;
pub mod session;
pub mod sink;
pub mod state;
pub mod template;
pub mod tls;

pub use self::{
    error::RelayError,
    session::{Flow, Session},
    state::RelaySettings,
};
