//! Synchronous signal dispatch
//!
//! A small Django-style signal: receivers are connected under a dispatch uid
//! and called in connection order whenever the signal is sent. The image store
//! uses it to announce deletions so that page references can be cleared.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Receiver function type
pub type ReceiverFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct SignalReceiver<T> {
	dispatch_uid: String,
	receiver: ReceiverFn<T>,
}

/// A signal carrying events of type `T`
pub struct Signal<T> {
	receivers: Arc<RwLock<Vec<SignalReceiver<T>>>>,
}

impl<T> Signal<T> {
	/// Create a signal with no receivers
	pub fn new() -> Self {
		Self {
			receivers: Arc::new(RwLock::new(Vec::new())),
		}
	}

	/// Connect a receiver.
	///
	/// A receiver already connected under the same `dispatch_uid` is replaced,
	/// so connecting twice never delivers an event twice.
	///
	/// # Examples
	///
	/// ```
	/// use homesite_cms::signals::Signal;
	/// use std::sync::Arc;
	/// use std::sync::atomic::{AtomicUsize, Ordering};
	///
	/// let signal: Signal<u32> = Signal::new();
	/// let seen = Arc::new(AtomicUsize::new(0));
	/// let counter = seen.clone();
	/// signal.connect("count", move |value: &u32| {
	///     counter.fetch_add(*value as usize, Ordering::SeqCst);
	/// });
	///
	/// assert_eq!(signal.send(&3), 1);
	/// assert_eq!(seen.load(Ordering::SeqCst), 3);
	/// ```
	pub fn connect<F>(&self, dispatch_uid: impl Into<String>, receiver: F)
	where
		F: Fn(&T) + Send + Sync + 'static,
	{
		let dispatch_uid = dispatch_uid.into();
		let mut receivers = self.receivers.write();
		receivers.retain(|r| r.dispatch_uid != dispatch_uid);
		receivers.push(SignalReceiver {
			dispatch_uid,
			receiver: Arc::new(receiver),
		});
	}

	/// Disconnect the receiver registered under `dispatch_uid`
	pub fn disconnect(&self, dispatch_uid: &str) -> bool {
		let mut receivers = self.receivers.write();
		let original_len = receivers.len();
		receivers.retain(|r| r.dispatch_uid != dispatch_uid);
		receivers.len() < original_len
	}

	/// Send an event to every connected receiver, returning how many ran
	pub fn send(&self, event: &T) -> usize {
		// Snapshot the receivers so a receiver may connect or disconnect
		// without deadlocking.
		let receivers: Vec<ReceiverFn<T>> = self
			.receivers
			.read()
			.iter()
			.map(|r| r.receiver.clone())
			.collect();

		for receiver in &receivers {
			receiver(event);
		}
		receivers.len()
	}

	/// Number of connected receivers
	pub fn receiver_count(&self) -> usize {
		self.receivers.read().len()
	}
}

impl<T> Default for Signal<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			receivers: self.receivers.clone(),
		}
	}
}

impl<T> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("receivers", &self.receiver_count())
			.finish()
	}
}
