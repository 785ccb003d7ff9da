//! English singular/plural forms for type and field names.
//!
//! Foreign keys are derived from singular type names (`articles` ->
//! `article_id`) and schema files are registered under plural names
//! (`user.json` -> `users`). Only the last `_`-separated word is inflected,
//! so `users_articles` singularizes to `users_article`.

/// Singular form of the last word in `word`.
pub fn singularize(word: &str) -> String {
    inflect_last_word(word, 1)
}

/// Plural form of the last word in `word`. Already-plural words are kept.
pub fn pluralize(word: &str) -> String {
    inflect_last_word(word, 2)
}

fn inflect_last_word(word: &str, count: isize) -> String {
    let (head, last) = match word.rfind('_') {
        Some(idx) => word.split_at(idx + 1),
        None => ("", word),
    };
    if last.is_empty() {
        return word.to_string();
    }
    format!("{}{}", head, pluralizer::pluralize(last, count, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singularize_regular() {
        assert_eq!(singularize("things"), "thing");
        assert_eq!(singularize("articles"), "article");
        assert_eq!(singularize("authors"), "author");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("boxes"), "box");
    }

    #[test]
    fn singularize_es_plurals() {
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("quizzes"), "quiz");
        assert_eq!(singularize("buses"), "bus");
        assert_eq!(singularize("heroes"), "hero");
        assert_eq!(singularize("movies"), "movie");
    }

    #[test]
    fn singularize_irregular_and_unchanged() {
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("sheep"), "sheep");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("user"), "user");
    }

    #[test]
    fn singularize_compound_names() {
        assert_eq!(singularize("users_articles"), "users_article");
        assert_eq!(singularize("line_items"), "line_item");
        assert_eq!(singularize("order_statuses"), "order_status");
    }

    #[test]
    fn pluralize_words() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("users"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("quiz"), "quizzes");
        assert_eq!(pluralize("hero"), "heroes");
        assert_eq!(pluralize("movie"), "movies");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("users_article"), "users_articles");
    }
}
