pub mod cdp;
pub mod error;
pub mod page;
pub mod session;

pub use cdp::CdpPage;
pub use error::BrowserError;
pub use page::{PageDriver, PageSession, ResponsePredicate, ResponseWatcher, SessionProvider};
pub use session::{ChromeSessionProvider, SessionConfig};
