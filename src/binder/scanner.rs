#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
}

fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// Blank out quoted literals and comments so a `?` or `:name` inside them is
/// never mistaken for a placeholder.
///
/// Quoted spans honor the doubled-quote escape (`'it''s'`); line comments run
/// to end of line and block comments nest. Every masked byte becomes a space,
/// so byte offsets in the returned string line up with the input.
pub(crate) fn mask_literals(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => {
                    state = State::SingleQuoted;
                    out.push(b' ');
                }
                b'"' => {
                    state = State::DoubleQuoted;
                    out.push(b' ');
                }
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    out.push(b' ');
                    out.push(b' ');
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    out.push(b' ');
                    out.push(b' ');
                    idx += 1;
                }
                _ => out.push(b),
            },
            State::SingleQuoted => {
                out.push(b' ');
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        out.push(b' ');
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                out.push(b' ');
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        out.push(b' ');
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                out.push(b' ');
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    out.push(b' ');
                    out.push(b' ');
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    out.push(b' ');
                    out.push(b' ');
                    idx += 1;
                } else {
                    out.push(b' ');
                }
            }
        }
        idx += 1;
    }

    // Masked bytes are all ASCII spaces; the rest is the original UTF-8.
    String::from_utf8(out).unwrap_or_else(|e| {
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    })
}
