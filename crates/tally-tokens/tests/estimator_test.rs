use serde_json::json;
use tally_core::{ImageDetail, StopReason, parse_messages};
use tally_tokens::{LEGACY_MODEL, TokenEstimator};

#[test]
fn test_single_message_overhead() {
    let estimator = TokenEstimator::new();
    let messages = parse_messages(&json!([
        {"role": "user", "content": "hello world"}
    ]))
    .unwrap();

    // overhead + "user" (1) + "hello world" (2) + reply priming (3)
    assert_eq!(estimator.tokens_for_messages(&messages, "gpt-4").unwrap(), 3 + 1 + 2 + 3);
    assert_eq!(estimator.tokens_for_messages(&messages, "").unwrap(), 3 + 1 + 2 + 3);
    assert_eq!(
        estimator.tokens_for_messages(&messages, LEGACY_MODEL).unwrap(),
        4 + 1 + 2 + 3
    );
}

#[test]
fn test_three_message_overhead() {
    let estimator = TokenEstimator::new();
    let messages = parse_messages(&json!([
        {"role": "user", "content": "hello world"},
        {"role": "user", "content": "hello world"},
        {"role": "user", "content": "hello world"}
    ]))
    .unwrap();

    let standard = estimator.tokens_for_messages(&messages, "gpt-3.5-turbo").unwrap();
    let unknown = estimator.tokens_for_messages(&messages, "some-unlisted-model").unwrap();
    let legacy = estimator.tokens_for_messages(&messages, LEGACY_MODEL).unwrap();

    assert_eq!(standard, 3 * (3 + 1 + 2 + 3));
    assert_eq!(unknown, standard);
    assert_eq!(legacy, 3 * (4 + 1 + 2 + 3));
}

#[test]
fn test_message_count_is_idempotent() {
    let estimator = TokenEstimator::new();
    let messages = parse_messages(&json!([
        {"role": "system", "content": "You are terse."},
        {"role": "user", "content": [
            {"type": "text", "text": "Describe this picture"},
            {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
        ]}
    ]))
    .unwrap();

    let first = estimator.tokens_for_messages(&messages, "gpt-4o").unwrap();
    let second = estimator.tokens_for_messages(&messages, "gpt-4o").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_image_part_adds_no_text_tokens() {
    let estimator = TokenEstimator::new();
    let with_image = parse_messages(&json!([
        {"role": "user", "content": [
            {"type": "text", "text": "hello world"},
            {"type": "image_url", "image_url": {"url": "https://example.com/cat.jpg", "detail": "high"}}
        ]}
    ]))
    .unwrap();
    let text_only = parse_messages(&json!([
        {"role": "user", "content": "hello world"}
    ]))
    .unwrap();

    assert_eq!(
        estimator.tokens_for_messages(&with_image, "gpt-4").unwrap(),
        estimator.tokens_for_messages(&text_only, "gpt-4").unwrap()
    );
}

#[test]
fn test_empty_text_is_zero_for_any_model() {
    let estimator = TokenEstimator::new();
    for model in ["", "gpt-4", "gpt-4o", "text-davinci-003", LEGACY_MODEL, "nope"] {
        assert_eq!(estimator.tokens_for_text("", model).unwrap(), 0, "model {model}");
    }
}

#[test]
fn test_truncation_respects_budget() {
    let estimator = TokenEstimator::new();
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);
    let full = estimator.tokens_for_text(&text, "gpt-4").unwrap();

    for max_tokens in [0, 1, 5, 17, full - 1, full, full + 1, full * 2] {
        let result = estimator.truncate(&text, max_tokens, "gpt-4").unwrap();

        assert!(result.token_count <= max_tokens);
        if result.token_count == max_tokens {
            assert_eq!(result.reason, StopReason::Length);
        } else {
            assert_eq!(result.reason, StopReason::Stop);
            assert_eq!(result.text, text);
        }
        assert!(text.starts_with(&result.text));
    }
}

#[test]
fn test_truncation_of_real_text() {
    let estimator = TokenEstimator::new();

    let cut = estimator.truncate("hello world", 1, "").unwrap();
    assert_eq!(cut.text, "hello");
    assert_eq!(cut.token_count, 1);
    assert_eq!(cut.reason, StopReason::Length);

    let fits = estimator.truncate("hello world", 10, "").unwrap();
    assert_eq!(fits.text, "hello world");
    assert_eq!(fits.token_count, 2);
    assert_eq!(fits.reason, StopReason::Stop);

    let zero = estimator.truncate("hello world", 0, "").unwrap();
    assert_eq!(zero.text, "");
    assert_eq!(zero.token_count, 0);
    assert_eq!(zero.reason, StopReason::Length);
}

#[test]
fn test_truncation_marks_split_characters() {
    let estimator = TokenEstimator::new();
    let text = "日本語のテキストを切り詰める 🦀🦀🦀";
    let full = estimator.tokens_for_text(text, "gpt-4").unwrap();

    for max_tokens in 0..=full {
        let result = estimator.truncate(text, max_tokens, "gpt-4").unwrap();
        let whole = result.text.trim_end_matches('\u{FFFD}');
        assert!(text.starts_with(whole), "budget {max_tokens}");
        assert_eq!(result.token_count, max_tokens);
    }

    let crab = estimator.truncate("🦀", 1, "gpt-4").unwrap();
    assert_eq!(crab.text, "\u{FFFD}");
    assert_eq!(crab.token_count, 1);
    assert_eq!(crab.reason, StopReason::Length);
}

#[test]
fn test_tool_calls_add_no_tokens() {
    let estimator = TokenEstimator::new();
    let with_calls = parse_messages(&json!([{
        "role": "assistant",
        "content": "calling",
        "tool_calls": [{
            "id": "call_1",
            "type": "function",
            "function": {"name": "lookup", "arguments": "{}"}
        }]
    }]))
    .unwrap();
    let without = parse_messages(&json!([
        {"role": "assistant", "content": "calling"}
    ]))
    .unwrap();

    assert_eq!(
        estimator.tokens_for_messages(&with_calls, "gpt-4").unwrap(),
        estimator.tokens_for_messages(&without, "gpt-4").unwrap()
    );
}

#[test]
fn test_image_estimates() {
    let estimator = TokenEstimator::new();

    assert_eq!(estimator.tokens_for_image(4096, 4096, ImageDetail::Low), 85);
    assert_eq!(estimator.tokens_for_image(100, 100, ImageDetail::High), 255);
    assert_eq!(estimator.tokens_for_image(4096, 4096, ImageDetail::High), 765);
    assert_eq!(estimator.tokens_for_image(4096, 4096, ImageDetail::from("auto")), 765);
}
