//! Path extraction from `diff --git` header lines.
//!
//! Git writes `diff --git a/<old> b/<new>` and switches to C-style quoted
//! tokens (`"a/sp ace.txt"`) when a path contains characters it would
//! otherwise have to escape. Tokenizing and decoding are kept separate:
//! [`tokenize_header_paths`] only splits, [`decode_path_token`] only decodes.

/// Placeholder used when a header does not yield a usable path.
pub const UNKNOWN_FILE: &str = "(unknown-file)";

/// Splits the tail of a `diff --git` header into raw path tokens.
///
/// A double-quoted run is kept as one token, quotes included. A backslash
/// is preserved and makes the following character literal, so `\ ` never
/// splits and `\"` never toggles quoting. An unterminated quote simply runs
/// to the end of the input.
pub fn tokenize_header_paths(rest: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in rest.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                current.push(ch);
                escaped = true;
            }
            '"' => {
                current.push(ch);
                in_quotes = !in_quotes;
            }
            ' ' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Decodes one raw path token and strips its `a/` or `b/` side prefix.
///
/// Quoted tokens are parsed as JSON string literals first. Tokens JSON
/// rejects are decoded as C strings, which adds git's octal byte escapes
/// (`\303\251` is `é`). If both fail the surrounding quotes are dropped and
/// the inner text is kept verbatim. Unquoted tokens only have `\ `
/// collapsed to a space.
pub fn decode_path_token(token: &str) -> String {
    let token = token.trim();

    let decoded = if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        let inner = &token[1..token.len() - 1];
        serde_json::from_str::<String>(token)
            .ok()
            .or_else(|| decode_c_quoted(inner))
            .unwrap_or_else(|| inner.to_string())
    } else if token == "\"" {
        String::new()
    } else {
        token.replace("\\ ", " ")
    };

    strip_side_prefix(&decoded).to_string()
}

/// Extracts `(source, destination)` paths from a full `diff --git` line.
///
/// Returns `None` when the line carries fewer than two path tokens.
pub fn parse_header_paths(header_line: &str) -> Option<(String, String)> {
    let rest = header_line
        .strip_prefix(super::diff_split::FILE_DIFF_MARKER)
        .unwrap_or(header_line);
    let tokens = tokenize_header_paths(rest);
    if tokens.len() < 2 {
        return None;
    }
    Some((decode_path_token(&tokens[0]), decode_path_token(&tokens[1])))
}

/// Resolves the display path for a header line: destination, else source,
/// else [`UNKNOWN_FILE`].
pub fn header_file_path(header_line: &str) -> String {
    match parse_header_paths(header_line) {
        Some((source, destination)) => {
            if !destination.is_empty() {
                destination
            } else if !source.is_empty() {
                source
            } else {
                UNKNOWN_FILE.to_string()
            }
        }
        None => UNKNOWN_FILE.to_string(),
    }
}

/// Decodes the body of a C-quoted string as git writes it. Octal escapes
/// are raw bytes, so multi-byte UTF-8 sequences are reassembled before
/// conversion. Returns `None` on an unknown or dangling escape.
fn decode_c_quoted(inner: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let byte = match chars.next()? {
            'a' => 0x07,
            'b' => 0x08,
            't' => b'\t',
            'n' => b'\n',
            'v' => 0x0b,
            'f' => 0x0c,
            'r' => b'\r',
            '"' => b'"',
            '\\' => b'\\',
            first @ '0'..='3' => {
                let mut value = first.to_digit(8)?;
                for _ in 0..2 {
                    let digit = chars.next()?.to_digit(8)?;
                    value = value * 8 + digit;
                }
                u8::try_from(value).ok()?
            }
            _ => return None,
        };
        bytes.push(byte);
    }

    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn strip_side_prefix(path: &str) -> &str {
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
}
