pub mod classify;
pub mod model;
pub mod parser;
pub mod printer;
pub mod rewrite;

use std::path::Path;

use crate::error::Result;

pub use self::classify::retain;
pub use self::parser::parse;
pub use self::printer::print;
pub use self::rewrite::replace_decls;

/// Run the whole pipeline over one file's bytes: parse, keep
/// import/type/const/var declarations, print them canonically.
pub fn extract_skeleton(bytes: Vec<u8>, path: &Path) -> Result<String> {
    let parsed = parse(bytes, path)?;
    let unit = parsed.unit()?;
    let retained = retain(&unit.decls);
    let unit = replace_decls(unit, retained);
    print(&unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkelError;

    fn extract(code: &str) -> Result<String> {
        extract_skeleton(code.as_bytes().to_vec(), Path::new("input.go"))
    }

    #[test]
    fn test_type_kept_function_dropped() {
        let code = r#"package shapes

type Point struct {
	X, Y float64
}

func (p Point) Norm() float64 {
	return math.Sqrt(p.X*p.X + p.Y*p.Y)
}
"#;
        let out = extract(code).unwrap();
        assert_eq!(out, "package shapes\n\ntype Point struct {\n\tX, Y float64\n}\n");
        assert!(!out.contains("Sqrt"));
    }

    #[test]
    fn test_only_functions_leaves_package_clause() {
        let code = "package main\n\nfunc main() {\n\trun()\n}\n\nfunc run() {}\n";
        assert_eq!(extract(code).unwrap(), "package main\n");
    }

    #[test]
    fn test_const_group_survives_unchanged() {
        let code = r#"package level

const (
	Low = iota
	Mid
	High
)

func Parse(s string) int { return 0 }
"#;
        assert_eq!(
            extract(code).unwrap(),
            "package level\n\nconst (\n\tLow = iota\n\tMid\n\tHigh\n)\n"
        );
    }

    #[test]
    fn test_invalid_source_fails() {
        let code = "package a\n\ntype T struct {\n\tA int\n\nfunc f() {\n";
        assert!(matches!(extract(code), Err(SkelError::Parse { .. })));
    }

    #[test]
    fn test_build_constraint_and_floating_comments_survive() {
        let code = r#"//go:build linux

// Package sys wraps syscalls.
package sys

import "syscall"

// Deprecated: use New.
func Old() {}

// Fd is a descriptor.
type Fd int
"#;
        let expected = r#"//go:build linux

// Package sys wraps syscalls.
package sys

import "syscall"

// Fd is a descriptor.
type Fd int
"#;
        assert_eq!(extract(code).unwrap(), expected);
    }

    #[test]
    fn test_order_preserved_across_kinds() {
        let code = r#"package a

var before = 1

func f() {}

type T int

func g() {}

const C = "c"

var after = 2
"#;
        let out = extract(code).unwrap();
        let positions: Vec<usize> = ["var before", "type T", "const C", "var after"]
            .iter()
            .map(|needle| out.find(needle).expect("declaration retained"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!out.contains("func"));
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let code = r#"package config

import (
	"time"

	yaml "gopkg.in/yaml.v3"
)

// Options controls the client.
type Options struct {
	Endpoint string `yaml:"endpoint"`
	Timeout time.Duration `yaml:"timeout"` // per request
	Retries int
	Hooks struct{ Before, After func() }
}

type Mode uint8

const MinPort, MaxPort = 1, 65535

const (
	ModeFast Mode = iota // fast path
	ModeSafe
)

var DefaultOptions = Options{
	Endpoint: "localhost:8080",
	Timeout: 5 * time.Second,
}

var decode = yaml.Unmarshal

func (o *Options) Validate() error { return nil }
"#;
        let first = extract(code).unwrap();
        let second = extract(&first).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\tTimeout  time.Duration `yaml:\"timeout\"` // per request\n"));
        assert!(first.contains("\tTimeout:  5 * time.Second,\n"));
        assert!(!first.contains("Validate"));
        assert!(first.contains("\nconst MinPort, MaxPort = 1, 65535\n"));
    }

    #[test]
    fn test_multi_name_const_reparses() {
        let code = "package a\n\nconst X, Y = 1, 2\n\nconst (\n\tA, B = iota, iota\n)\n";
        let first = extract(code).unwrap();
        assert_eq!(first, code);
        assert_eq!(extract(&first).unwrap(), first);
    }
}
