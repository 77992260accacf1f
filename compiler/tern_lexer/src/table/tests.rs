use super::*;

#[test]
fn lookups_return_registered_ids() {
    let table = TokenTable::new()
        .keyword("if", TokenId(1))
        .special(b'+', TokenId(2))
        .digraph("!=", TokenId(3));
    assert_eq!(table.keyword_id("if"), Some(TokenId(1)));
    assert_eq!(table.keyword_id("iff"), None);
    assert_eq!(table.special_id(b'+'), Some(TokenId(2)));
    assert_eq!(table.special_id(b'-'), None);
    assert_eq!(table.digraph_id(b'!', b'='), Some(TokenId(3)));
    assert_eq!(table.digraph_id(b'=', b'!'), None);
}

#[test]
fn non_ascii_special_is_ignored() {
    let table = TokenTable::new().special(200, TokenId(9));
    assert_eq!(table.special_id(200), None);
}

#[test]
fn re_registering_digraph_replaces_id() {
    let table = TokenTable::new()
        .digraph("<=", TokenId(1))
        .digraph("<=", TokenId(2));
    assert_eq!(table.digraph_id(b'<', b'='), Some(TokenId(2)));
}

#[test]
fn malformed_digraph_is_ignored() {
    let table = TokenTable::new().digraph("<=>", TokenId(1));
    assert_eq!(table.digraph_id(b'<', b'='), None);
}

#[test]
fn comment_marker_is_configurable() {
    assert_eq!(TokenTable::new().comment(), b"#");
    assert_eq!(TokenTable::new().comment_marker("//").comment(), b"//");
}
