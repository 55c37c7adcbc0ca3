//! Text preparation for speech synthesis.
//!
//! Two concerns: turning an assistant reply (markdown, emoji, reasoning
//! blocks) into plain speakable prose, and splitting prose into chunks
//! short enough that platform engines synthesise them reliably.
//!
//! Lengths are counted in `char`s, not bytes, so Romanian diacritics do not
//! eat into the budget twice.

/// Clean an assistant reply for narration.
///
/// - Reasoning blocks (`<think>`, `<reasoning>`, …) are removed entirely
/// - Fenced code blocks become "Code omitted."
/// - Heading, list and blockquote markers are dropped
/// - Links keep their text, images their alt text
/// - Inline code, bold, italic and strikethrough markers are dropped
/// - HTML tags and pictographic emoji are removed
/// - Line breaks become sentence breaks
#[must_use]
pub fn clean_for_speech(text: &str) -> String {
    let text = strip_thinking_blocks(text);

    let mut result = String::with_capacity(text.len());
    let mut in_code_block = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            if !in_code_block {
                push_sentence(&mut result, "Code omitted.");
            }
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block || is_horizontal_rule(trimmed) {
            continue;
        }

        let processed = strip_line_markdown(line);
        let processed = strip_emoji(&processed);
        push_sentence(&mut result, processed.trim());
    }

    collapse_whitespace(&result)
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Sentences (ending in `.`, `!` or `?`) are packed greedily. A sentence
/// longer than the budget is split on clause punctuation, then between
/// words, and as a last resort inside a word.
#[must_use]
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if char_len(text) <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let sentence_len = char_len(&sentence);

        if sentence_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_long_sentence(&sentence, max_chars));
            continue;
        }

        if !current.is_empty() && char_len(&current) + 1 + sentence_len > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&sentence);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split text into sentences at `.` `!` `?` followed by whitespace.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_some_and(|next| next.is_whitespace());
        if at_boundary {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split an overly long sentence at clause boundaries (, ; : — –).
fn split_long_sentence(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut clauses = Vec::new();
    let mut current = String::new();

    for part in sentence.split_inclusive(&[',', ';', ':', '—', '–'][..]) {
        if !current.is_empty() && char_len(&current) + char_len(part) > max_chars {
            clauses.push(std::mem::take(&mut current).trim().to_string());
        }
        current.push_str(part);
    }
    let tail = current.trim();
    if !tail.is_empty() {
        clauses.push(tail.to_string());
    }

    clauses
        .into_iter()
        .filter(|c| !c.is_empty())
        .flat_map(|clause| {
            if char_len(&clause) > max_chars {
                hard_split(&clause, max_chars)
            } else {
                vec![clause]
            }
        })
        .collect()
}

/// Last-resort split between words, breaking words that are themselves
/// longer than the budget.
fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if char_len(word) > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        if !current.is_empty() && char_len(&current) + 1 + char_len(word) > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Append `sentence`, closing the previous one with a full stop if it
/// did not end in punctuation.
fn push_sentence(result: &mut String, sentence: &str) {
    if sentence.is_empty() {
        return;
    }
    let last = result.trim_end().chars().last();
    match last {
        None => {}
        Some('.' | '!' | '?' | ':' | ';' | ',') => result.push(' '),
        Some(_) => result.push_str(". "),
    }
    result.push_str(sentence);
}

/// Remove `<think>…</think>` style reasoning blocks so that
/// chain-of-thought is never read aloud.
fn strip_thinking_blocks(text: &str) -> String {
    let mut result = text.to_string();
    for (open, close) in [
        ("<think", "</think>"),
        ("<reasoning>", "</reasoning>"),
        ("<|START_THINKING|>", "<|END_THINKING|>"),
    ] {
        result = strip_tag_block_pair(&result, open, close);
    }
    result
}

/// Remove all occurrences of `<open_prefix…>…<close_tag>`, case-insensitive.
/// An unterminated block is left in place.
fn strip_tag_block_pair(text: &str, open_prefix: &str, close_tag: &str) -> String {
    let mut result = String::with_capacity(text.len());
    // ASCII lowering keeps byte offsets aligned with `text`.
    let haystack = text.to_ascii_lowercase();
    let open_lower = open_prefix.to_ascii_lowercase();
    let close_lower = close_tag.to_ascii_lowercase();
    let mut cursor = 0;

    while let Some(offset) = haystack[cursor..].find(&open_lower) {
        let open_start = cursor + offset;
        let block_end = haystack[open_start..].find('>').and_then(|gt| {
            let body_start = open_start + gt + 1;
            haystack[body_start..]
                .find(&close_lower)
                .map(|close| body_start + close + close_tag.len())
        });

        if let Some(end) = block_end {
            result.push_str(&text[cursor..open_start]);
            cursor = end;
        } else {
            let keep_to = open_start + open_prefix.len();
            result.push_str(&text[cursor..keep_to]);
            cursor = keep_to;
        }
    }
    result.push_str(&text[cursor..]);
    result
}

fn is_horizontal_rule(line: &str) -> bool {
    let chars: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    chars.len() >= 3
        && matches!(chars[0], '-' | '*' | '_')
        && chars.iter().all(|&c| c == chars[0])
}

fn strip_line_markdown(line: &str) -> String {
    let mut s = line.trim_start();
    while let Some(rest) = s.strip_prefix('>') {
        s = rest.trim_start();
    }
    let s = s.trim_start_matches('#').trim_start();
    let s = strip_list_marker(s);
    let s = strip_images(s);
    let s = strip_links(&s);
    let s = strip_emphasis(&s);
    strip_html_tags(&s)
}

fn strip_list_marker(line: &str) -> &str {
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("+ "))
    {
        return rest;
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let after = &line[digits..];
        if let Some(rest) = after.strip_prefix(". ").or_else(|| after.strip_prefix(") ")) {
            return rest;
        }
    }
    line
}

/// `![alt](url)` becomes `alt`.
fn strip_images(text: &str) -> String {
    text.replace("![", "[")
}

/// `[text](url)` becomes `text`.
fn strip_links(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '[' {
            result.push(c);
            continue;
        }
        let link_text: String = chars.by_ref().take_while(|&c| c != ']').collect();
        if chars.peek() == Some(&'(') {
            chars.next();
            chars.by_ref().take_while(|&c| c != ')').for_each(drop);
            result.push_str(&link_text);
        } else {
            result.push('[');
            result.push_str(&link_text);
            result.push(']');
        }
    }
    result
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "")
        .replace("__", "")
        .replace("~~", "")
        .replace(['*', '`'], "")
}

fn strip_html_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

fn strip_emoji(text: &str) -> String {
    text.chars().filter(|&c| !is_emoji(c)).collect()
}

const fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF  // pictographs, emoticons, transport, flags
            | 0x2600..=0x27BF  // misc symbols, dingbats
            | 0x2B00..=0x2BFF  // arrows, stars
            | 0xFE0F           // variation selector
            | 0x200D           // zero-width joiner
    )
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
