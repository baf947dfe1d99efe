//! Adapts [`sentinel_core::RequestInput`] to the view the hotspot argument
//! extractor expects, so the engine doesn't need its own copy of this logic.

use sentinel_core::{RequestInput, Value};
use sentinel_hotspot::ExtractableRequest;

pub(crate) struct RequestView<'a> {
    input: &'a RequestInput,
}

impl<'a> RequestView<'a> {
    pub(crate) fn new(input: &'a RequestInput) -> Self {
        Self { input }
    }
}

impl ExtractableRequest for RequestView<'_> {
    fn attachment(&self, key: &str) -> Option<&str> {
        self.input.attachments.get(key).map(String::as_str)
    }

    fn header(&self, key: &str) -> Option<&str> {
        self.input.headers.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    fn metadata(&self, key: &str) -> Option<&str> {
        self.input.metadata.get(key).map(String::as_str)
    }

    fn positional(&self, index: usize) -> Option<&Value> {
        self.input.args.get(index)
    }

    fn positional_len(&self) -> usize {
        self.input.args.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::Value;
    use std::collections::HashMap;

    #[test]
    fn headers_take_first_value() {
        let mut input = RequestInput::default();
        input.headers.insert("tenant".to_string(), vec!["acme".to_string(), "other".to_string()]);
        let view = RequestView::new(&input);
        assert_eq!(view.header("tenant"), Some("acme"));
    }

    #[test]
    fn positional_args_are_passed_through_unflattened() {
        let input = RequestInput {
            args: vec![Value::Int(42), Value::from("x")],
            headers: HashMap::new(),
            metadata: HashMap::new(),
            attachments: HashMap::new(),
            body: None,
        };
        let view = RequestView::new(&input);
        assert_eq!(view.positional(0), Some(&Value::Int(42)));
        assert_eq!(view.positional_len(), 2);
    }
}
