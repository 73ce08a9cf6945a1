//! Bundle event delivery.
//!
//! Synchronous listeners run inline on the firing thread. Asynchronous
//! listeners are handed to a dedicated dispatcher thread that delivers jobs
//! one at a time, in the order they were fired. A panicking listener is
//! logged and the remaining listeners still run.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use modwire_hooks::{BundleEvent, ListenerEntry};
use parking_lot::Mutex;

enum Job {
	Deliver {
		event: BundleEvent,
		receivers: Vec<ListenerEntry>,
		span: tracing::Span,
	},
	Flush {
		ack: mpsc::Sender<()>,
	},
}

pub(crate) struct EventDispatcher {
	tx: Mutex<Option<mpsc::Sender<Job>>>,
	worker: Mutex<Option<JoinHandle<()>>>,
}

impl EventDispatcher {
	/// Spawns the dispatcher thread. With `threaded` unset no thread is
	/// started and asynchronous listeners are called inline.
	pub(crate) fn new(threaded: bool) -> std::io::Result<Self> {
		if !threaded {
			return Ok(Self {
				tx: Mutex::new(None),
				worker: Mutex::new(None),
			});
		}

		let (tx, rx) = mpsc::channel::<Job>();
		let worker = thread::Builder::new()
			.name("modwire-events".into())
			.spawn(move || {
				while let Ok(job) = rx.recv() {
					match job {
						Job::Deliver { event, receivers, span } => {
							let _guard = span.enter();
							deliver(&event, &receivers);
						}
						Job::Flush { ack } => {
							let _ = ack.send(());
						}
					}
				}
				tracing::debug!("event dispatcher stopped");
			})?;

		Ok(Self {
			tx: Mutex::new(Some(tx)),
			worker: Mutex::new(Some(worker)),
		})
	}

	pub(crate) fn deliver_sync(&self, event: &BundleEvent, receivers: &[ListenerEntry]) {
		deliver(event, receivers);
	}

	/// Queues delivery to asynchronous listeners, or delivers inline when the
	/// dispatcher is not running.
	pub(crate) fn deliver_async(&self, event: BundleEvent, receivers: Vec<ListenerEntry>) {
		if receivers.is_empty() {
			return;
		}
		let job = Job::Deliver {
			event,
			receivers,
			span: tracing::Span::current(),
		};
		let rejected = match self.tx.lock().as_ref() {
			Some(tx) => tx.send(job).err().map(|err| err.0),
			None => Some(job),
		};
		if let Some(Job::Deliver { event, receivers, .. }) = rejected {
			deliver(&event, &receivers);
		}
	}

	/// Blocks until every job queued before the call has been delivered.
	pub(crate) fn flush(&self) {
		let (ack, done) = mpsc::channel();
		let sent = self
			.tx
			.lock()
			.as_ref()
			.is_some_and(|tx| tx.send(Job::Flush { ack }).is_ok());
		if sent {
			let _ = done.recv();
		}
	}

	/// Drains queued jobs and joins the dispatcher thread.
	pub(crate) fn shutdown(&self) {
		drop(self.tx.lock().take());
		if let Some(worker) = self.worker.lock().take()
			&& worker.join().is_err()
		{
			tracing::error!("event dispatcher thread panicked");
		}
	}
}

impl Drop for EventDispatcher {
	fn drop(&mut self) {
		self.shutdown();
	}
}

fn deliver(event: &BundleEvent, receivers: &[ListenerEntry]) {
	for entry in receivers {
		let result = catch_unwind(AssertUnwindSafe(|| entry.listener.bundle_changed(event)));
		if let Err(payload) = result {
			tracing::error!(
				listener = entry.id.0,
				context = %entry.context,
				event = ?event.kind,
				panic = panic_message(payload.as_ref()),
				"bundle listener panicked"
			);
		}
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
	payload
		.downcast_ref::<&str>()
		.copied()
		.or_else(|| payload.downcast_ref::<String>().map(String::as_str))
		.unwrap_or("non-string panic payload")
}
