use phrase_assert as pa;
use pa::grammar::VOCABULARY;
use pa::{find_phrase, parse_phrase, Error};
use proptest::prelude::*;

fn vocabulary_entry() -> impl Strategy<Value = (&'static str, pa::Keyword)> {
    proptest::sample::select(VOCABULARY.to_vec())
}

proptest! {
    #[test]
    fn test_recognised_phrases_round_trip(
        (literal, keyword) in vocabulary_entry(),
        lead in proptest::sample::select(vec!["", "is ", "do ", "does ", "to "]),
        negation in proptest::sample::select(vec!["", "not ", "to not "]),
        be in proptest::sample::select(vec!["", "to ", "be ", "to be "]),
        soft in any::<bool>(),
        suffix in proptest::sample::select(vec!["", "s", "es", " to"]),
    ) {
        let phrase = format!(
            "{lead}{negation}{be}{}{literal}{suffix}",
            if soft { "softly " } else { "" }
        );
        let found = parse_phrase(&phrase).unwrap();
        prop_assert_eq!(found.keyword, keyword);
        prop_assert_eq!(found.reverse, !negation.is_empty());
        prop_assert_eq!(found.soft, soft);

        let sentence = format!("the value {phrase} something");
        prop_assert!(find_phrase(&sentence).is_some());
    }

    #[test]
    fn test_unknown_words_are_rejected(word in "[a-z]{3,12}") {
        prop_assume!(VOCABULARY.iter().all(|(lit, _)| !word.starts_with(lit)));
        let phrase = format!("to {word}");
        let rejected = matches!(parse_phrase(&phrase), Err(Error::ValidationNotSupported(_)));
        prop_assert!(rejected);
    }
}
