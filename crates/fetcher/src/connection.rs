//! NETCONF connection seam

use crate::{FetchError, Result, NETCONF_MONITORING_NS};

/// Minimal NETCONF session used by the schema store
///
/// `get` and `dispatch` return the raw `<rpc-reply>` text; reply parsing and
/// `<rpc-error>` detection happen in the store so every implementation gets
/// the same treatment.
#[cfg_attr(test, mockall::automock)]
pub trait NetconfConnection {
    /// Capabilities the server announced in its `<hello>`
    fn server_capabilities(&self) -> Result<Vec<String>>;

    /// Issue a `<get>` with the given subtree filter
    fn get(&mut self, filter: &str) -> Result<String>;

    /// Issue an arbitrary RPC body
    fn dispatch(&mut self, request: &str) -> Result<String>;
}

impl<T: NetconfConnection + ?Sized> NetconfConnection for &mut T {
    fn server_capabilities(&self) -> Result<Vec<String>> {
        (**self).server_capabilities()
    }

    fn get(&mut self, filter: &str) -> Result<String> {
        (**self).get(filter)
    }

    fn dispatch(&mut self, request: &str) -> Result<String> {
        (**self).dispatch(request)
    }
}

/// Verify the server can serve its schema catalog
///
/// Any capability URI mentioning `ietf-netconf-monitoring` is accepted.
pub fn ensure_monitoring_capability(capabilities: &[String]) -> Result<()> {
    if capabilities
        .iter()
        .any(|cap| cap.contains("ietf-netconf-monitoring"))
    {
        Ok(())
    } else {
        Err(FetchError::Precondition(NETCONF_MONITORING_NS.to_string()))
    }
}
