/** A macro to parse a [`Pattern`](crate::Pattern) once per call site.

The pattern source is parsed the first time the call site runs and
cached in a process-wide static, so matching in a hot loop never
reparses. It evaluates to a `&'static Pattern`.

Panics if the source is not a valid expression.

# Example
```
use parsched::*;

let t: Tree = "x - (-y)".parse().unwrap();
for _ in 0..3 {
    let b = pattern!("a - (-b)").search(&t).unwrap();
    assert_eq!(b["b"], Tree::var("y"));
}
```
**/
#[macro_export]
macro_rules! pattern {
    ($src:expr) => {{
        static PATTERN: $crate::__private::Lazy<$crate::Pattern> =
            $crate::__private::Lazy::new(|| {
                $src.parse()
                    .unwrap_or_else(|err| panic!("bad pattern {:?}: {}", $src, err))
            });
        &*PATTERN
    }};
}

/** A macro to easily create a [`Rewrite`](crate::Rewrite).

The form is `rewrite!(name; lhs => rhs)`, where both sides are pattern
sources. Variables bound by the left side are substituted into the
right side.

Panics if either side is not a valid expression.

```
use parsched::*;

let rules = [
    rewrite!("add-0"; "x + 0" => "x"),
    rewrite!("sub-0"; "0 - x" => "-x"),
];

let t: Tree = "0 - (a + 0)".parse().unwrap();
let t = rules[1].apply(&t).unwrap();
assert_eq!(t.to_string(), "-(a + 0)");
assert_eq!(rules[0].apply(&t.children()[0]), Some(Tree::var("a")));
```
**/
#[macro_export]
macro_rules! rewrite {
    ($name:expr; $lhs:tt => $rhs:tt) => {{
        let lhs: $crate::Pattern = $lhs
            .parse()
            .unwrap_or_else(|err| panic!("bad pattern {:?}: {}", $lhs, err));
        let rhs: $crate::Pattern = $rhs
            .parse()
            .unwrap_or_else(|err| panic!("bad pattern {:?}: {}", $rhs, err));
        $crate::Rewrite::new($name, lhs, rhs)
    }};
}
