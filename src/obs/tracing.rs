// crates.io
use ::tracing::{Instrument, Span, instrument::Instrumented, span::EnteredSpan};
// self
use crate::{_prelude::*, auth::ConnectorId, obs::FlowKind};

/// A span builder used by connector flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind, stage, and connector.
	pub fn new(kind: FlowKind, stage: &'static str, connector: &ConnectorId) -> Self {
		let span = ::tracing::info_span!(
			"github_connector.flow",
			flow = kind.as_str(),
			stage,
			connector = connector.as_ref()
		);

		Self { span }
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> EnteredSpan {
		self.span.entered()
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}
