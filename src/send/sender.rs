use super::{ResponseSender, SendResponseEvent};
use crate::error::Result;
use crate::event::Event;

/// Priority of the default [`HttpResponseSender`].
pub const HTTP_SENDER_PRIORITY: i32 = -4000;

/// Writes the status line, headers and body.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpResponseSender;

impl HttpResponseSender {
    fn send_headers(event: &mut SendResponseEvent) -> Result<()> {
        if event.headers_sent() {
            return Ok(());
        }
        {
            let response = event.response();
            let mut sink = event.sink()?;
            write!(sink, "{:?} {}\r\n", response.version(), response.status())?;
            for (name, value) in response.headers() {
                sink.write_all(name.as_str().as_bytes())?;
                sink.write_all(b": ")?;
                sink.write_all(value.as_bytes())?;
                sink.write_all(b"\r\n")?;
            }
            sink.write_all(b"\r\n")?;
        }
        event.set_headers_sent();
        Ok(())
    }
}

impl ResponseSender for HttpResponseSender {
    fn send(&self, event: &mut SendResponseEvent) -> Result<()> {
        Self::send_headers(event)?;
        BodyResponseSender.send(event)
    }
}

/// Writes the body only.
#[derive(Debug, Default, Clone, Copy)]
pub struct BodyResponseSender;

impl ResponseSender for BodyResponseSender {
    fn send(&self, event: &mut SendResponseEvent) -> Result<()> {
        if !event.content_sent() {
            {
                let body = event.response().body().clone();
                let mut sink = event.sink()?;
                sink.write_all(&body)?;
                sink.flush()?;
            }
            event.set_content_sent();
        }
        event.stop_propagation(true);
        Ok(())
    }
}
