use rand::RngCore;

use mocksmith_core::Response;
use mocksmith_generate::weighted_index;

/// One weighted draw over `responses`, or over `defaults` when none are declared.
pub fn choose_response(
    responses: &[Response],
    defaults: &[Response],
    rng: &mut dyn RngCore,
) -> Response {
    let candidates = if responses.is_empty() {
        defaults
    } else {
        responses
    };
    let weights: Vec<f64> = candidates
        .iter()
        .map(|response| f64::from(response.weight))
        .collect();
    weighted_index(&weights, rng)
        .and_then(|index| candidates.get(index))
        .cloned()
        .unwrap_or_default()
}
