#![no_main]

use libfuzzer_sys::fuzz_target;
use tabledrag::{DragOverOutcome, EngineConfig, RowSpec, TableDrag, ValidatorConfig, is_dense};
use tabledrag_core::{RowId, SensorHit};

fuzz_target!(|data: &[u8]| {
    // First byte: row count (1..=32). Second: optional depth ceiling.
    if data.len() < 2 {
        return;
    }
    let count = usize::from(data[0] % 32) + 1;
    let mut config = EngineConfig::default().with_nesting_drag_distance(16);
    if data[1] & 0x80 != 0 {
        config = config.with_validator(ValidatorConfig::MaxDepth {
            max: u32::from(data[1] % 4),
        });
    }
    let mut bytes = data[2..].iter().copied();

    let mut depth = 0_u32;
    let rows: Vec<RowSpec> = (0..count)
        .map(|i| {
            if i > 0 {
                depth = match bytes.next().unwrap_or(0) % 3 {
                    0 => depth + 1,
                    1 => depth,
                    _ => depth / 2,
                };
            }
            RowSpec::new().with_id(format!("r{i}")).with_depth(depth)
        })
        .collect();
    let Ok(mut engine) = TableDrag::new(rows, &config) else {
        return;
    };

    // Remaining bytes: gestures of (row, start_x, updates, [kind, target, x?]*).
    while let Some(row) = bytes.next() {
        let ids = engine.sequence().ids();
        let dragged = ids[usize::from(row) % ids.len()].clone();
        let start_x = i32::from(bytes.next().unwrap_or(0) as i8);
        engine.on_drag_start(&dragged, start_x).expect("no gesture active");

        let updates = bytes.next().unwrap_or(0) % 8;
        for _ in 0..updates {
            let kind = bytes.next().unwrap_or(0);
            let target: RowId = ids[usize::from(bytes.next().unwrap_or(0)) % ids.len()].clone();
            // High bit of the kind byte pins x to the far edges.
            let x = match (kind & 0x80 != 0, kind & 0x40 != 0) {
                (true, true) => i32::MAX,
                (true, false) => i32::MIN,
                _ => i32::from(bytes.next().unwrap_or(0) as i8) * 2,
            };
            let hit = match kind % 4 {
                0 => SensorHit::above(target),
                1 => SensorHit::below(target),
                2 => SensorHit::both(target.clone(), target),
                _ => SensorHit::none(),
            };
            let before = engine.sequence().clone();
            match engine.on_drag_over(x, 0, &hit).expect("plan applies") {
                DragOverOutcome::Committed { .. } => {
                    let nodes = engine.nodes();
                    assert_eq!(nodes[0].depth(), 0, "first row nested");
                    for pair in nodes.windows(2) {
                        assert!(pair[1].depth() <= pair[0].depth().saturating_add(1), "depth jump");
                    }
                    assert!(is_dense(engine.sequence()), "weights not dense");
                }
                DragOverOutcome::Rejected { .. } | DragOverOutcome::Unchanged { .. } => {
                    assert_eq!(engine.sequence(), &before, "sequence changed without commit");
                }
                DragOverOutcome::NoActiveGesture => unreachable!("gesture is active"),
            }
        }
        engine.on_drag_end().expect("gesture summary");
    }
});
