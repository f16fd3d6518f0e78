//! End-to-end rule grammar tests.

use nids_rules::{
    parse_rule, Action, ByteTestOp, Content, ContentPosKey, Direction, Dsize, Endian, FlowMatcher,
    IpAddress, Port, RuleParseError, RuleProtocol, SuruleOption,
};
use std::net::Ipv4Addr;

#[test]
fn minimal_rule_parses_in_source_order() {
    let rule = parse_rule(r#"alert tcp any any -> any any (msg:"test"; sid:1;)"#).unwrap();

    assert_eq!(rule.header.action, Action::Alert);
    assert_eq!(rule.header.protocol, RuleProtocol::Tcp);
    assert_eq!(rule.header.direction, Direction::Uni);
    assert!(rule.header.src_addr.is_any());
    assert!(rule.header.dst_port.is_any());

    assert_eq!(rule.options.len(), 2);
    assert_eq!(rule.options[0], SuruleOption::Message("test".to_string()));
    assert_eq!(rule.options[1], SuruleOption::Sid(1));
    assert_eq!(rule.sid(), Some(1));
    assert_eq!(rule.message(), Some("test"));
}

#[test]
fn full_header_with_lists_and_ranges() {
    let rule = parse_rule(
        r#"drop tcp ["192.168.0.0/16", !"192.168.0.3"] any <> "192.168.0.110" [445, 3389, 1024:] (sid:7;)"#,
    )
    .unwrap();

    assert_eq!(rule.header.action, Action::Drop);
    assert_eq!(rule.header.direction, Direction::Bi);

    let src = &rule.header.src_addr;
    assert_eq!(src.accept.as_ref().map(|a| a.len()), Some(1));
    assert_eq!(
        src.except,
        Some(vec![IpAddress::Addr(Ipv4Addr::new(192, 168, 0, 3))])
    );

    let dst_ports = rule.header.dst_port.accept.as_ref().unwrap();
    assert_eq!(
        dst_ports,
        &vec![
            Port::Single(445),
            Port::Single(3389),
            Port::Range {
                min: 1024,
                max: u16::MAX
            },
        ]
    );
}

#[test]
fn content_modifiers_fold_into_preceding_content() {
    let rule = parse_rule(
        r#"alert tcp any any -> any any (content:"|ff|SMB"; nocase; content:"|02 00|"; distance:14; within:2; sid:9;)"#,
    )
    .unwrap();

    let contents: Vec<&Content> = rule
        .options
        .iter()
        .filter_map(|o| match o {
            SuruleOption::Content(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0].pattern, b"\xffSMB");
    assert!(contents[0].nocase);
    assert_eq!(contents[0].pos_key, ContentPosKey::NotSet);
    assert_eq!(
        contents[1].pos_key,
        ContentPosKey::Relative {
            within: Some(2),
            distance: Some(14),
        }
    );
}

#[test]
fn reference_rule_end_to_end() {
    let rule = parse_rule(concat!(
        r#"alert tcp ["192.168.0.0/16", !"192.168.0.3"] any -> "192.168.0.110" [445,3389] ("#,
        r#"msg:"ET DOS NetrWkstaUserEnum Request with large Preferred Max Len"; "#,
        r#"flow:established,to_server; content:"|ff|SMB"; content:"|10 00 00 00|"; distance:0; "#,
        r#"content:"|02 00|"; distance:14; within:2; "#,
        r#"byte_jump:4,12,relative,little,multiplier 2; "#,
        r#"content:"|00 00 00 00 00 00 00 00|"; distance:12; within:8; "#,
        r#"byte_test:4,>,2,0,relative; "#,
        r#"reference:cve,2006-6723; classtype:attempted-dos; sid:2003236; rev:4; "#,
        r#"metadata:created_at 2010_07_30, updated_at 2010_07_30;)"#,
    ))
    .unwrap();

    assert_eq!(rule.sid(), Some(2003236));

    let flow = rule
        .options
        .iter()
        .find_map(|o| match o {
            SuruleOption::Flow(f) => Some(f),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        flow.0,
        vec![FlowMatcher::Established, FlowMatcher::ToServer]
    );

    let byte_jump = rule
        .options
        .iter()
        .find_map(|o| match o {
            SuruleOption::ByteJump(b) => Some(b),
            _ => None,
        })
        .unwrap();
    assert_eq!(byte_jump.count, 4);
    assert_eq!(byte_jump.offset, 12);
    assert!(byte_jump.relative);
    assert_eq!(byte_jump.endian, Some(Endian::Little));
    assert_eq!(byte_jump.multiplier, Some(2));

    let byte_test = rule
        .options
        .iter()
        .find_map(|o| match o {
            SuruleOption::ByteTest(b) => Some(b),
            _ => None,
        })
        .unwrap();
    assert_eq!(byte_test.op, ByteTestOp::Greater);
    assert_eq!(byte_test.value, 2);
    assert!(byte_test.relative);

    let dsize_free = rule
        .options
        .iter()
        .all(|o| !matches!(o, SuruleOption::Dsize(_)));
    assert!(dsize_free);
}

#[test]
fn unknown_keyword_reports_its_offset() {
    let line = r#"alert tcp any any -> any any (msg:"x"; shenanigans:1; sid:3;)"#;
    let err = parse_rule(line).unwrap_err();
    let RuleParseError::UnknownKeyword { keyword, offset } = err else {
        panic!("expected UnknownKeyword, got {err:?}");
    };
    assert_eq!(keyword, "shenanigans");
    assert_eq!(&line[offset..offset + keyword.len()], "shenanigans");
}

#[test]
fn unrecognized_protocol_reports_name_and_offset() {
    let line = "alert quic any any -> any any (sid:1;)";
    let err = parse_rule(line).unwrap_err();
    let RuleParseError::UnrecognizedProtocol { name, offset } = err else {
        panic!("expected UnrecognizedProtocol, got {err:?}");
    };
    assert_eq!(name, "quic");
    assert_eq!(&line[offset..offset + 4], "quic");
}

#[test]
fn orphaned_modifier_fails_the_rule() {
    let err =
        parse_rule(r#"alert tcp any any -> any any (nocase; sid:1;)"#).unwrap_err();
    assert!(matches!(
        err,
        RuleParseError::InvalidOptionArgument { keyword: "nocase", .. }
    ));
}

#[test]
fn conflicting_anchors_fail_the_rule() {
    let err = parse_rule(
        r#"alert tcp any any -> any any (content:"x"; offset:2; within:4; sid:1;)"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RuleParseError::InvalidOptionArgument { keyword: "within", .. }
    ));
}

#[test]
fn escaped_semicolon_stays_in_message() {
    let rule =
        parse_rule(r#"alert tcp any any -> any any (msg:"a\;b"; sid:1;)"#).unwrap();
    assert_eq!(rule.message(), Some("a;b"));
}

#[test]
fn dsize_option_parses() {
    let rule =
        parse_rule(r#"alert udp any any -> any any (dsize:300<>400; sid:1;)"#).unwrap();
    assert_eq!(rule.options[0], SuruleOption::Dsize(Dsize::Range(300, 400)));
}

#[test]
fn missing_option_section_is_an_error() {
    let err = parse_rule("alert tcp any any -> any any").unwrap_err();
    assert_eq!(err, RuleParseError::MissingOptions);
}

#[test]
fn unterminated_option_value_is_an_error() {
    let err = parse_rule(r#"alert tcp any any -> any any (msg:"x""#).unwrap_err();
    assert!(matches!(err, RuleParseError::UnterminatedOptionValue(_)));
}

#[test]
fn trailing_garbage_is_an_error() {
    let err = parse_rule(r#"alert tcp any any -> any any (sid:1;) extra"#).unwrap_err();
    assert!(matches!(err, RuleParseError::TrailingInput(_)));
}

#[test]
fn parsing_is_idempotent() {
    let line = r#"alert tcp any any -> any 445 (msg:"probe"; content:"|ff|SMB"; nocase; sid:5; rev:2;)"#;
    let first = parse_rule(line).unwrap();
    let second = parse_rule(line).unwrap();
    assert_eq!(first, second);
}

#[test]
fn rules_serialize_round_trip() {
    let line = r#"alert tcp ["10.0.0.0/8"] any -> any [80, 443] (msg:"web"; content:"login"; nocase; sid:11;)"#;
    let rule = parse_rule(line).unwrap();
    let json = serde_json::to_string(&rule).unwrap();
    let back: nids_rules::Surule = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rule);
}
