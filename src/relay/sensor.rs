//! The shared sensor process and its broadcast hub.
//!
//! One hub is built at startup and handed to the router. It owns the sending
//! half of a broadcast channel; every stream subscribes its own receiver, so
//! detaching one consumer never touches the others or the process.

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::SensorConfig;
use crate::error::RelayError;

use super::stream::LidAngleStream;

pub struct SensorHub {
    feed: Result<broadcast::Sender<Arc<str>>, RelayError>,
}

impl SensorHub {
    /// A hub with no producer attached yet. Lines arrive through `publish`.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        SensorHub { feed: Ok(tx) }
    }

    /// A hub whose process never started. Every stream reports `error`.
    pub fn failed(error: RelayError) -> Self {
        SensorHub { feed: Err(error) }
    }

    /// Spawn the sensor process and start pumping its stdout into the hub.
    ///
    /// Must be called inside a tokio runtime. A spawn failure is not
    /// returned here; it is kept and surfaced to each stream on first poll.
    pub fn spawn(config: &SensorConfig, capacity: usize) -> Arc<Self> {
        let command = config.command.display().to_string();
        let mut child = match Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!(%command, error = %e, "sensor process failed to start");
                return Arc::new(SensorHub::failed(RelayError::Startup {
                    command,
                    reason: e.to_string(),
                }));
            }
        };
        info!(%command, pid = child.id(), "sensor process started");

        let hub = Arc::new(SensorHub::new(capacity));
        if let Some(stdout) = child.stdout.take() {
            hub.pump(stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).split(b'\n');
                while let Ok(Some(line)) = lines.next_segment().await {
                    warn!(target: "lidcordion::sensor", "{}", String::from_utf8_lossy(&line).trim_end());
                }
            });
        }
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => warn!(%status, "sensor process exited"),
                Err(e) => warn!(error = %e, "could not wait on sensor process"),
            }
        });

        hub
    }

    /// A hub fed from any line-oriented reader instead of a child process.
    pub fn from_reader<R>(reader: R, capacity: usize) -> Arc<Self>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let hub = Arc::new(SensorHub::new(capacity));
        hub.pump(reader);
        hub
    }

    fn pump<R>(&self, reader: R)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let Ok(tx) = &self.feed else {
            return;
        };
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).split(b'\n');
            loop {
                match lines.next_segment().await {
                    Ok(Some(line)) => {
                        let line: Arc<str> = String::from_utf8_lossy(&line).into();
                        // No receivers is fine: nobody is listening right now.
                        let _ = tx.send(line);
                    }
                    Ok(None) => {
                        debug!("sensor output closed");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "sensor output read failed");
                        break;
                    }
                }
            }
        });
    }

    /// Broadcast one line to every attached stream. Returns how many
    /// streams received it.
    pub fn publish(&self, line: &str) -> usize {
        match &self.feed {
            Ok(tx) => tx.send(Arc::from(line)).unwrap_or(0),
            Err(_) => 0,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        match &self.feed {
            Ok(tx) => tx.receiver_count(),
            Err(_) => 0,
        }
    }

    /// A new lazy stream. Nothing is subscribed until it is first polled.
    pub fn create_stream(self: &Arc<Self>) -> LidAngleStream {
        LidAngleStream::new(Arc::clone(self))
    }

    pub(crate) fn subscribe(&self) -> Result<broadcast::Receiver<Arc<str>>, RelayError> {
        match &self.feed {
            Ok(tx) => Ok(tx.subscribe()),
            Err(e) => Err(e.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let hub = SensorHub::new(4);
        assert_eq!(hub.publish("10"), 0);
        let _rx = hub.subscribe().unwrap();
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(hub.publish("20"), 1);
    }

    #[tokio::test]
    async fn missing_command_fails_every_stream() {
        let config = SensorConfig {
            command: PathBuf::from("/nonexistent/lid-angle-sensor"),
            args: Vec::new(),
        };
        let hub = SensorHub::spawn(&config, 4);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.publish("10"), 0);

        for _ in 0..2 {
            let mut stream = hub.create_stream();
            let first = stream.next().await.unwrap();
            assert!(matches!(first, Err(RelayError::Startup { .. })));
            assert!(stream.next().await.is_none());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawned_sensor_lines_reach_streams() {
        // ~100 KiB on stderr, more than a pipe holds, before the second line.
        let config = SensorConfig {
            command: PathBuf::from("/bin/sh"),
            args: vec![
                "-c".into(),
                "sleep 0.3; echo ' 30 '; yes oops | head -n 20000 >&2; echo 40".into(),
            ],
        };
        let hub = SensorHub::spawn(&config, 8);
        let mut stream = hub.create_stream();

        for expected in ["data: 30\n\n", "data: 40\n\n"] {
            let item = tokio::time::timeout(Duration::from_secs(5), stream.next())
                .await
                .expect("sensor line never arrived");
            assert_eq!(item, Some(Ok(expected.to_string())));
        }
    }

    #[tokio::test]
    async fn reader_lines_are_decoded_lossily() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let hub = SensorHub::from_reader(reader, 8);
        let mut rx = hub.subscribe().unwrap();

        use tokio::io::AsyncWriteExt;
        writer.write_all(b"12\n\xff3\n").await.unwrap();

        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&*first, "12");
        let second = rx.recv().await.unwrap();
        assert_eq!(&*second, "\u{fffd}3");
    }
}
