use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use mocksmith_core::Response;
use mocksmith_output::choose_response;

fn response(status_code: u16, weight: u32) -> Response {
    Response {
        status_code,
        weight,
        ..Response::default()
    }
}

#[test]
fn weights_bias_the_draw() {
    let responses = [response(200, 1), response(500, 99)];
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let errors = (0..2_000)
        .filter(|_| choose_response(&responses, &[], &mut rng).status_code == 500)
        .count();
    assert!(errors > 1_900, "500 drawn {errors} times");
    assert!(errors < 2_000, "200 never drawn");
}

#[test]
fn defaults_apply_when_the_schema_declares_none() {
    let defaults = [response(202, 1)];
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    assert_eq!(choose_response(&[], &defaults, &mut rng).status_code, 202);
    assert_eq!(choose_response(&[], &[], &mut rng), Response::default());
}

#[test]
fn a_single_response_is_always_chosen() {
    let responses = [response(418, 7)];
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    for _ in 0..20 {
        assert_eq!(choose_response(&responses, &[], &mut rng).status_code, 418);
    }
}
