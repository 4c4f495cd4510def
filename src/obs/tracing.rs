// self
use crate::{_prelude::*, obs::SyncKind};

/// Future type produced by [`SyncSpan::instrument`] when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedSync<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedSync<F> = F;

/// Span handle attached to one relay operation.
#[derive(Clone, Debug)]
pub struct SyncSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl SyncSpan {
	/// Opens a span tagged with the operation kind and the emitting stage.
	pub fn new(kind: SyncKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("auth_relay.sync", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span for a synchronous section.
	pub fn entered(self) -> SyncSpanGuard {
		#[cfg(feature = "tracing")]
		{
			SyncSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			SyncSpanGuard {}
		}
	}

	/// Attaches the span to an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedSync<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`SyncSpan::entered`].
pub struct SyncSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for SyncSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("SyncSpanGuard(..)")
	}
}
