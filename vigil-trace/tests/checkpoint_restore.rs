use std::collections::HashSet;

use vigil_guards::{DuplicateInputs, Guard};
use vigil_trace::{
    Checkpointable, GuardsCheckpointState, GuardsContext, ModuleContext, TracingContext,
};

mod common;
use common::{guard, local, nn_param, type_match};

#[test]
fn restore_of_fresh_checkpoint_is_identity() {
    let f = type_match();
    let mut ctx = GuardsContext::new();
    ctx.add(guard("L['a']", &f));
    ctx.add(guard("L['b']", &f));
    let before: HashSet<Guard> = ctx.dynamo_guards().clone();

    let checkpoint = ctx.copy_graphstate();
    ctx.restore_graphstate(checkpoint);

    assert_eq!(ctx.dynamo_guards(), &before);
}

#[test]
fn restore_discards_exactly_the_guards_added_after_checkpoint() {
    let f = type_match();
    let mut ctx = GuardsContext::new();
    ctx.add(guard("L['a']", &f));
    let checkpoint = ctx.copy_graphstate();

    ctx.add(guard("L['b']", &f));
    ctx.add(guard("L['c']", &f));
    assert_eq!(ctx.len(), 3);

    ctx.restore_graphstate(checkpoint.clone());
    assert_eq!(ctx.len(), 1);
    assert!(ctx.contains(&guard("L['a']", &f)));
    assert_eq!(ctx.copy_graphstate(), checkpoint);
}

#[test]
fn checkpoint_survives_repeated_restores() {
    let f = type_match();
    let mut ctx = GuardsContext::new();
    let checkpoint = ctx.copy_graphstate();

    for attempt in 0..3 {
        ctx.add(guard(&format!("L['attempt_{attempt}']"), &f));
        ctx.restore_graphstate(checkpoint.clone());
        assert!(ctx.is_empty());
    }
}

#[test]
fn env_exprs_are_not_rolled_back() {
    let f = type_match();
    let mut ctx = GuardsContext::new();
    let checkpoint = ctx.copy_graphstate();

    ctx.add(guard("L['a']", &f));
    ctx.add_env_expr(DuplicateInputs::new(local("L['a']"), local("L['b']")).unwrap());
    ctx.restore_graphstate(checkpoint);

    assert!(ctx.is_empty());
    assert_eq!(ctx.aotautograd_guards().len(), 1);
}

#[test]
fn guards_diff_is_one_directional() {
    let f = type_match();
    let g1 = guard("L['g1']", &f);
    let g2 = guard("L['g2']", &f);
    let g3 = guard("L['g3']", &f);

    let a = GuardsCheckpointState::new([g1.clone(), g2.clone()].into());
    let b = GuardsCheckpointState::new([g1.clone()].into());

    let expected: HashSet<Guard> = [g2.clone()].into();
    assert_eq!(a.diff(&b), Some(expected));
    assert_eq!(b.diff(&a), None);
    assert!(b.is_covered_by(&a));
    assert!(!a.is_covered_by(&b));
    // Coverage in one direction is not equality.
    assert_ne!(a, b);

    // Neither side covers the other, so both directions report a difference.
    let c = GuardsCheckpointState::new([g1, g3.clone()].into());
    let only_c: HashSet<Guard> = [g3].into();
    let only_a: HashSet<Guard> = [g2].into();
    assert_eq!(c.diff(&a), Some(only_c));
    assert_eq!(a.diff(&c), Some(only_a));
}

#[test]
fn module_restore_keeps_issued_names_reserved() {
    let mut ctx = ModuleContext::new();
    ctx.register("weight", nn_param("self.fc.weight")).unwrap();
    let checkpoint = ctx.copy_graphstate();

    let speculative = ctx.register("weight", nn_param("self.proj.weight")).unwrap();
    assert_eq!(speculative, "weight_1");
    ctx.restore_graphstate(checkpoint.clone());

    assert_eq!(ctx.len(), 1);
    assert!(ctx.get("weight_1").is_none());
    assert_eq!(ctx.copy_graphstate(), checkpoint);

    let retried = ctx.register("weight", nn_param("self.proj.weight")).unwrap();
    assert_eq!(retried, "weight_2");
}

#[test]
fn tracing_checkpoint_covers_guards_and_modules_only() {
    let f = type_match();
    let mut ctx = TracingContext::new(None);
    ctx.guards_context.add(guard("L['x']", &f));
    let checkpoint = ctx.copy_graphstate();

    ctx.guards_context.add(guard("L['y']", &f));
    ctx.module_context.register("bias", nn_param("self.bias")).unwrap();
    let pos = ctx.record_arg_source(local("L['x']"));

    ctx.restore_graphstate(checkpoint);
    assert_eq!(ctx.guards_context.len(), 1);
    assert!(ctx.module_context.is_empty());
    assert_eq!(pos, 0);
    assert_eq!(ctx.aot_autograd_arg_pos_to_source().len(), 1);
}

#[test]
fn sorted_guards_are_stable_across_insert_order() {
    let f = type_match();
    let names = ["L['zeta']", "L['a']", "L['mid']", "L['b']"];

    let mut forward = GuardsContext::new();
    for name in names {
        forward.add(guard(name, &f));
    }
    let mut backward = GuardsContext::new();
    for name in names.iter().rev() {
        backward.add(guard(name, &f));
    }

    let order = |ctx: &GuardsContext| -> Vec<String> {
        ctx.sorted_guards().iter().map(|g| g.name().to_string()).collect()
    };
    assert_eq!(order(&forward), order(&backward));
    assert_eq!(order(&forward), ["L['a']", "L['b']", "L['mid']", "L['zeta']"]);
}
