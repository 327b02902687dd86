//! A cancellable, lazily attached stream of framed lid-angle records.

use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio_stream::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

use crate::error::RelayError;

use super::sensor::SensorHub;
use super::sse::frame_event;

enum State {
    /// Created but never polled. Holds no subscription.
    Idle(Arc<SensorHub>),
    Attached(BroadcastStream<Arc<str>>),
    /// The sensor never started; the error is yielded once.
    Failed(RelayError),
    Done,
}

pub struct LidAngleStream {
    state: State,
}

impl LidAngleStream {
    pub(crate) fn new(hub: Arc<SensorHub>) -> Self {
        LidAngleStream {
            state: State::Idle(hub),
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.state, State::Attached(_))
    }

    /// Detach from the hub. Calling it again, or after the stream ended,
    /// does nothing.
    pub fn cancel(&mut self) {
        match mem::replace(&mut self.state, State::Done) {
            State::Attached(_) => debug!("lid-angle stream detached"),
            State::Idle(_) | State::Failed(_) => debug!("lid-angle stream cancelled before attach"),
            State::Done => {}
        }
    }
}

impl Stream for LidAngleStream {
    type Item = Result<String, RelayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match mem::replace(&mut this.state, State::Done) {
                State::Idle(hub) => match hub.subscribe() {
                    Ok(rx) => {
                        debug!("lid-angle stream attached");
                        this.state = State::Attached(BroadcastStream::new(rx));
                    }
                    Err(e) => this.state = State::Failed(e),
                },
                State::Attached(mut rx) => match Pin::new(&mut rx).poll_next(cx) {
                    Poll::Pending => {
                        this.state = State::Attached(rx);
                        return Poll::Pending;
                    }
                    Poll::Ready(Some(Ok(line))) => {
                        this.state = State::Attached(rx);
                        return Poll::Ready(Some(Ok(frame_event(&line))));
                    }
                    // A gapped sequence is never delivered; the client reconnects.
                    Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                        warn!(skipped, "lid-angle consumer fell behind, closing stream");
                        return Poll::Ready(None);
                    }
                    Poll::Ready(None) => {
                        debug!("sensor hub closed");
                        return Poll::Ready(None);
                    }
                },
                State::Failed(e) => {
                    warn!(error = %e, "lid-angle stream unavailable");
                    return Poll::Ready(Some(Err(e)));
                }
                State::Done => return Poll::Ready(None),
            }
        }
    }
}

impl Drop for LidAngleStream {
    fn drop(&mut self) {
        self.cancel();
    }
}
