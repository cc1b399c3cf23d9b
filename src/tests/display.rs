use crate::{tokenize, Highlighter, HighlightConfig, TokenStreamDisplay};

fn annotate(source: &str, generated: &str, ngram_size: usize) -> Vec<crate::Token> {
    Highlighter::with_config(HighlightConfig::new(ngram_size, 8).unwrap())
        .unwrap()
        .annotate(source, generated)
}

#[test]
fn test_display_without_matches() {
    let tokens = tokenize("Nada <b>citado</b> aqui.", false);
    let display = TokenStreamDisplay::new(&tokens);

    insta::assert_snapshot!(display, @"Nada  <b>  citado  </b>  aqui  .");
}

#[test]
fn test_display_single_passage() {
    let tokens = annotate(
        r#"<library-document title="D">um dois tres</library-document>"#,
        "x um dois tres",
        3,
    );
    let display = TokenStreamDisplay::new(&tokens);

    insta::assert_snapshot!(display, @r###"
    x  um  dois  tres
       ╰────────────╯Documento da Biblioteca, Título: D
    "###);
}

#[test]
fn test_display_page_boundary() {
    let tokens = annotate(
        r#"<library-document title="D"><page number="1">um dois</page><page number="2">tres quatro</page></library-document>"#,
        "um dois tres quatro",
        3,
    );
    let display = TokenStreamDisplay::new(&tokens);

    insta::assert_snapshot!(display, @r###"
    um  dois  tres  quatro
    ╰──────╯Documento da Biblioteca, Título: D, Pág: 1
              ╰──────────╯Documento da Biblioteca, Título: D, Pág: 2
    "###);
}
