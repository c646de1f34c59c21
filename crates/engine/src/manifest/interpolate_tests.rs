// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use similar_asserts::assert_eq;

fn yaml(s: &str) -> Value {
    serde_yaml::from_str(s).unwrap()
}

fn vars() -> Mapping {
    match yaml(
        "
internal_cidr: 10.0.0.0/24
internal_gw: 10.0.0.1
workers: 5
tags: [internal, jumpbox]
jumpbox_ssh:
  public_key: ssh-ed25519 AAAA
vcenter_cluster: cluster-a
",
    ) {
        Value::Mapping(m) => m,
        other => panic!("not a mapping: {other:?}"),
    }
}

fn render(doc: &str) -> Result<Value, InterpolateError> {
    let mut doc = yaml(doc);
    interpolate(&mut doc, &vars())?;
    Ok(doc)
}

#[yare::parameterized(
    scalar        = { "range: ((internal_cidr))",         "range: 10.0.0.0/24" },
    typed_number  = { "workers: ((workers))",             "workers: 5" },
    typed_list    = { "tags: ((tags))",                   "tags: [internal, jumpbox]" },
    dotted        = { "key: ((jumpbox_ssh.public_key))",  "key: ssh-ed25519 AAAA" },
    bang          = { "key: ((!internal_gw))",            "key: 10.0.0.1" },
    embedded      = { "url: https://((internal_gw)):25555", "url: https://10.0.0.1:25555" },
    two_in_one    = { "r: ((internal_gw))-((workers))",   "r: 10.0.0.1-5" },
    in_sequence   = { "dns: [((internal_gw))]",           "dns: [10.0.0.1]" },
    mapping_key   = { "((vcenter_cluster)): {rp: x}",     "cluster-a: {rp: x}" },
    untouched     = { "plain: text",                      "plain: text" },
)]
fn resolves(input: &str, expected: &str) {
    similar_asserts::assert_eq!(render(input).unwrap(), yaml(expected));
}

#[test]
fn reports_every_missing_variable_once() {
    let err = render("a: ((nope))\nb: ((also_nope))\nc: x-((nope))").unwrap_err();
    assert_eq!(err, InterpolateError::Missing(vec!["also_nope".into(), "nope".into()]));
}

#[test]
fn missing_nested_field_is_missing() {
    let err = render("a: ((jumpbox_ssh.private_key))").unwrap_err();
    assert_eq!(err, InterpolateError::Missing(vec!["jumpbox_ssh.private_key".into()]));
}

#[test]
fn lists_cannot_be_embedded_in_text() {
    let err = render("a: prefix-((tags))").unwrap_err();
    assert_eq!(err, InterpolateError::NotScalar("tags".into()));
}

#[test]
fn key_order_is_preserved() {
    let doc = render("z: ((internal_gw))\na: 1\nm: ((workers))").unwrap();
    assert_eq!(serde_yaml::to_string(&doc).unwrap(), "z: 10.0.0.1\na: 1\nm: 5\n");
}
