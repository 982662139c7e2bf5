// self
use crate::obs::FlowOutcome;

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(flow: &'static str, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"authkit_flow_total",
			"flow" => flow,
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (flow, outcome);
	}
}
