pub use self::{
    http::Gateway,
    source::{ChainSource, RawValue},
};

mod http;
mod source;
