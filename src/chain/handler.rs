//! Ordered handler chains with an optional fallback.

use std::any::type_name;

use tracing::{debug, warn};

use crate::error::{PatternError, PatternResult};

/// One handler in a chain
///
/// Returning `None` passes the request on to the next link.
pub trait ChainLink<Req, Resp>: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    fn handle(&self, request: &Req) -> Option<Resp>;
}

impl<Req, Resp, F> ChainLink<Req, Resp> for F
where
    F: Fn(&Req) -> Option<Resp> + Send + Sync,
{
    fn handle(&self, request: &Req) -> Option<Resp> {
        self(request)
    }
}

type Fallback<Req, Resp> = Box<dyn Fn(&Req) -> Resp + Send + Sync>;

/// Links tried in order until one handles the request
///
/// Each link is the successor of the one added before it. When no link
/// handles a request the fallback answers it; without a fallback the chain
/// fails with `Unhandled`.
pub struct Chain<Req, Resp> {
    name: String,
    links: Vec<Box<dyn ChainLink<Req, Resp>>>,
    fallback: Option<Fallback<Req, Resp>>,
}

impl<Req, Resp> Chain<Req, Resp> {
    /// Creates an empty chain
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: Vec::new(),
            fallback: None,
        }
    }

    /// Appends a link as the successor of the current last link
    pub fn link<L>(mut self, link: L) -> Self
    where
        L: ChainLink<Req, Resp> + 'static,
    {
        self.links.push(Box::new(link));
        self
    }

    /// Sets the answer used when no link handles a request
    pub fn fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&Req) -> Resp + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Passes the request down the chain
    pub fn handle(&self, request: &Req) -> PatternResult<Resp> {
        if let Some(response) = self.dispatch(request) {
            return Ok(response);
        }

        match &self.fallback {
            Some(fallback) => {
                debug!("Chain {} fell back", self.name);
                Ok(fallback(request))
            }
            None => {
                warn!("No link in chain {} handled the request", self.name);
                Err(PatternError::Unhandled {
                    chain: self.name.clone(),
                })
            }
        }
    }

    /// Number of links
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Checks if the chain has no links
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    fn dispatch(&self, request: &Req) -> Option<Resp> {
        self.links.iter().enumerate().find_map(|(idx, link)| {
            let response = link.handle(request)?;
            debug!("Link {} ({}) of chain {} handled the request", idx, link.name(), self.name);
            Some(response)
        })
    }
}

/// A chain can sit inside another chain; its fallback is skipped there so
/// unhandled requests move on to the outer chain's next link.
impl<Req, Resp> ChainLink<Req, Resp> for Chain<Req, Resp> {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, request: &Req) -> Option<Resp> {
        self.dispatch(request)
    }
}

impl<Req, Resp> std::fmt::Debug for Chain<Req, Resp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("links", &self.links.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
