mod account;
mod url;

pub use account::{Account, AccountSummary, Credentials};
pub use url::{LinkForm, LinkView, ShortLink};
