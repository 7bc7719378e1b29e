/// Explicit line break understood by the document writer.
pub const LINE_BREAK: &str = "<br/>";

pub const BULLET: &str = "\u{2022}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Bulleted,
    Numbered,
}

/// Turns newline/semicolon separated text into bullet or numbered entries
/// joined by [`LINE_BREAK`].
///
/// Text without any separator, or with nothing but separators and blanks, is
/// returned unchanged. Already formatted output therefore formats to itself.
pub fn format_list(text: &str, mode: ListMode) -> String {
    if !text.contains(['\n', ';']) {
        return text.to_string();
    }
    let items: Vec<&str> = text
        .split(['\n', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return text.to_string();
    }

    let entries: Vec<String> = match mode {
        ListMode::Numbered => items
            .iter()
            .enumerate()
            .map(|(i, it)| format!("{}. {}", i + 1, it))
            .collect(),
        ListMode::Bulleted => items.iter().map(|it| format!("{BULLET} {it}")).collect(),
    };
    entries.join(LINE_BREAK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_semicolons() {
        assert_eq!(
            format_list("a;b;c", ListMode::Numbered),
            "1. a<br/>2. b<br/>3. c"
        );
    }

    #[test]
    fn bulleted_newlines() {
        assert_eq!(format_list("a\nb", ListMode::Bulleted), "• a<br/>• b");
    }

    #[test]
    fn text_without_delimiters_is_unchanged() {
        assert_eq!(
            format_list("no delimiters here", ListMode::Numbered),
            "no delimiters here"
        );
        assert_eq!(format_list("", ListMode::Bulleted), "");
    }

    #[test]
    fn blank_items_are_dropped_and_only_separators_fall_back() {
        assert_eq!(
            format_list(" Map ;\r\n; Timeline\n", ListMode::Bulleted),
            "• Map<br/>• Timeline"
        );
        assert_eq!(format_list(" ; \n ", ListMode::Numbered), " ; \n ");
    }

    #[test]
    fn formatting_is_idempotent() {
        let once = format_list("read;discuss;write", ListMode::Numbered);
        assert_eq!(format_list(&once, ListMode::Numbered), once);
        let once = format_list("pencil\nnotebook", ListMode::Bulleted);
        assert_eq!(format_list(&once, ListMode::Bulleted), once);
    }
}
