use proptest::prelude::*;
use static_double::source::scanner::find_function;
use static_double::{FunctionRewriter, ParameterList, SourceExtractor};

/// Body fragments that put delimiters where a naive matcher would trip
fn body_piece() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        " $a = 1;",
        " echo '}';",
        " echo \"{\";",
        " echo 'it\\'s }';",
        " // } line comment\n",
        " # } hash comment\n",
        " /* { block */",
        " if ($a) { return ($a); }",
        " $f = function ($x) { return $x; };",
        " $s = \"{$a}\";",
    ])
}

fn body() -> impl Strategy<Value = String> {
    prop::collection::vec(body_piece(), 0..8).prop_map(|pieces| pieces.concat())
}

proptest! {
    #[test]
    fn test_finds_exact_function_around_tricky_bodies(
        prefix in "[a-e =$;\n]{0,20}",
        body in body(),
        suffix in "[a-e =$;\n]{0,20}",
    ) {
        let function = format!("function stub($a, $b = array(1, 2)) {{{}}}", body);
        let text = format!("{} {} ;{}", prefix, function, suffix);

        let bounds = find_function(&text, 0).unwrap();
        prop_assert_eq!(&text[bounds.start..bounds.end()], function.as_str());
        prop_assert_eq!(&text[bounds.body_open + 1..bounds.body_close], body.as_str());
    }

    #[test]
    fn test_rewritten_function_extracts_back_whole(body in body()) {
        let source = format!("function ($a) use ($v) {{{}}}", body);
        let mut rewriter = FunctionRewriter::from_source(&source, Some("renamed")).unwrap();
        rewriter.extract_capture_clause();
        rewriter.prepend("\\Hook::record('t', func_get_args());");

        let rendered = rewriter.render();
        let extracted = SourceExtractor::extract_from_text("renamed", &rendered).unwrap();
        prop_assert_eq!(extracted.as_str(), rendered.trim_end());
        prop_assert_eq!(rewriter.name(), "renamed");
    }

    #[test]
    fn test_required_count_never_exceeds_length(
        required in 0usize..4,
        optional in 0usize..4,
    ) {
        let mut params: Vec<String> = (0..required).map(|i| format!("$r{}", i)).collect();
        params.extend((0..optional).map(|i| format!("$o{} = {}", i, i)));
        let list = ParameterList::parse(&params.join(", ")).unwrap();

        prop_assert_eq!(list.len(), required + optional);
        prop_assert_eq!(list.required_count(), required);
    }
}
