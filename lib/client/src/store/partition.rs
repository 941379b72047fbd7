use http::Method;
use sparql_http_model::GraphName;
use std::collections::HashSet;
use std::num::NonZeroUsize;

/// The progress of a graph store write, one partition at a time.
///
/// A partition is a run of quads of the same graph that is sent in a single request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PartitionState {
    /// No request is open.
    Idle,
    /// A request for `graph` is open and `written` quads were sent in its body.
    Accumulating { graph: GraphName, written: usize },
    /// The body of the current request is closed and its response is awaited.
    Draining { graph: GraphName, written: usize },
    /// The input ended and every request completed.
    Closed,
}

/// What happens with the quad that was passed to [`PartitionState::on_quad`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    /// A new request has to be opened for the quad.
    Open,
    /// The quad goes into the body of the open request.
    Append,
    /// The open request is complete. The quad goes into the next one.
    Rotate,
}

impl PartitionState {
    pub(crate) fn on_quad(
        self,
        graph: &GraphName,
        max_quads_per_request: Option<NonZeroUsize>,
    ) -> (Self, Transition) {
        match self {
            Self::Idle => (
                Self::Accumulating {
                    graph: graph.clone(),
                    written: 1,
                },
                Transition::Open,
            ),
            Self::Accumulating {
                graph: current,
                written,
            } => {
                let has_room = max_quads_per_request.map_or(true, |max| written < max.get());
                if current == *graph && has_room {
                    (
                        Self::Accumulating {
                            graph: current,
                            written: written + 1,
                        },
                        Transition::Append,
                    )
                } else {
                    (
                        Self::Draining {
                            graph: current,
                            written,
                        },
                        Transition::Rotate,
                    )
                }
            }
            Self::Draining { .. } | Self::Closed => (self, Transition::Rotate),
        }
    }

    /// The input ended. The open request, if any, must be completed.
    pub(crate) fn on_end(self) -> Self {
        match self {
            Self::Idle | Self::Closed => Self::Closed,
            Self::Accumulating { graph, written } => Self::Draining { graph, written },
            Self::Draining { .. } => self,
        }
    }

    /// The response of the draining request was received.
    pub(crate) fn on_drained(self) -> Self {
        match self {
            Self::Draining { .. } => Self::Idle,
            state => state,
        }
    }
}

/// Picks the HTTP method of each request of a write.
///
/// The first request for a graph uses `first`, all following requests for the same graph use
/// `method`.
#[derive(Debug)]
pub(crate) struct MethodSelector {
    first: Option<Method>,
    method: Method,
    seen: HashSet<GraphName>,
}

impl MethodSelector {
    pub(crate) fn new(first: Option<Method>, method: Method) -> Self {
        Self {
            first,
            method,
            seen: HashSet::new(),
        }
    }

    pub(crate) fn select(&mut self, graph: &GraphName) -> Method {
        if self.seen.insert(graph.clone()) {
            self.first.clone().unwrap_or_else(|| self.method.clone())
        } else {
            self.method.clone()
        }
    }
}
