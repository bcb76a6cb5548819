use parsched::test::assert_value_preserved;
use parsched::*;

fn t(s: &str) -> Tree {
    s.parse().unwrap()
}

fn strings(trees: Trees) -> Vec<String> {
    trees.map(|t| t.to_string()).collect()
}

#[test]
fn product_commutations() {
    let tree = t("a * (b + c)");
    let all: Vec<Tree> = commutations(&tree).collect();
    assert_eq!(
        all.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
        ["a * (b + c)", "(b + c) * a", "a * (c + b)", "(c + b) * a"]
    );
    for other in &all {
        assert_value_preserved(&tree, other);
    }
}

#[test]
fn canonical_difference_commutations() {
    let tree = optimize(&t("a - b * c + k"));
    let all = strings(commutations(&tree));
    assert_eq!(
        all,
        [
            "a - ((b * c) - k)",
            "a + (k - (b * c))",
            "(-(b * c)) + (a + k)",
            "(-(b * c)) + (k + a)",
            "k - ((b * c) - a)",
            "k + (a - (b * c))",
            "a - ((c * b) - k)",
            "a + (k - (c * b))",
            "(-(c * b)) + (a + k)",
            "(-(c * b)) + (k + a)",
            "k - ((c * b) - a)",
            "k + (a - (c * b))",
        ]
    );
    for other in commutations(&tree) {
        assert_value_preserved(&tree, &other);
    }
}

#[test]
fn canonical_sum_commutations() {
    let tree = optimize(&t("a + b * c + k"));
    assert_eq!(
        strings(commutations(&tree)),
        [
            "a + ((b * c) + k)",
            "((b * c) + k) + a",
            "a + (k + (b * c))",
            "(k + (b * c)) + a",
            "a + ((c * b) + k)",
            "((c * b) + k) + a",
            "a + (k + (c * b))",
            "(k + (c * b)) + a",
        ]
    );
}

#[test]
fn early_termination_is_cheap() {
    // 2^15 commutations, only three are built
    let tree = optimize(&t("a + b + c + d + e + f + g + h + i + j + k + l + m + n + o + p"));
    let first: Vec<Tree> = commutations(&tree).take(3).collect();
    assert_eq!(first.len(), 3);
    assert_eq!(first[0], tree);
}

#[test]
fn associations_preserve_value() {
    let tree = t("(a - b) + (c * d) / e - f");
    let all: Vec<Tree> = associations(&tree).collect();
    assert!(all.len() > 1);
    assert_eq!(all[0], tree);
    for other in &all {
        assert_value_preserved(&tree, other);
    }
}

#[test]
fn factorization_chain() {
    let tree = t("(x * y + x * z) / w + v / w");
    let all: Vec<Tree> = factorizations(&tree).collect();
    assert_eq!(all[0], tree);
    let last = all.last().unwrap();
    assert_eq!(&Factorize.apply(last), last);
    assert!(all.len() >= 2);
    for other in &all {
        assert_value_preserved(&tree, other);
    }
}

#[test]
fn compositions_start_with_the_input() {
    let tree = t("a * b + a * c");
    let fc: Vec<Tree> = factorization_commutations(&tree).collect();
    let fca: Vec<Tree> = factorization_commutation_associations(&tree).collect();
    assert_eq!(fc[0], tree);
    assert_eq!(fca[0], tree);
    assert!(fc.contains(&t("(b + c) * a")));
    assert!(fca.len() >= fc.len());
    for other in fc.iter().chain(&fca) {
        assert_value_preserved(&tree, other);
    }
}

#[test]
fn generators_are_restartable() {
    let tree = t("(a + b) * (c - d) / (e * f)");
    for generator in [
        commutations as Generator,
        associations,
        factorizations,
        distributions,
        factorization_commutations,
        factorization_commutation_associations,
    ] {
        let first: Vec<Tree> = generator(&tree).collect();
        let second: Vec<Tree> = generator(&tree).collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
