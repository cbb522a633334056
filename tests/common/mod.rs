// (c) Copyright 2025 Helsing GmbH. All rights reserved.
#![allow(dead_code)]

use elevated::{Error, Registry, Shared, model, registry};
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

/// A flat record of primitives.
#[derive(Debug, Default)]
pub struct Record {
    pub count: Option<i64>,
    pub ratio: Option<f64>,
    pub note: Option<String>,
}

model!(Record as "Record" {
    primitive count,
    primitive ratio,
    primitive note,
});

impl Record {
    pub fn new(count: i64, ratio: f64, note: &str) -> Self {
        Self {
            count: Some(count),
            ratio: Some(ratio),
            note: Some(note.to_string()),
        }
    }
}

#[derive(Debug, Default)]
pub struct Container {
    pub record: Option<Shared<Record>>,
    pub records: Vec<Shared<Record>>,
    pub catalog: BTreeMap<String, Shared<Record>>,
}

model!(Container as "Container" {
    scalar record,
    array records,
    map catalog,
});

/// A tree whose nodes point back at their parent.
#[derive(Debug, Default)]
pub struct Tree {
    pub label: Option<String>,
    pub parent: Option<Shared<Tree>>,
    pub children: Vec<Shared<Tree>>,
}

model!(Tree as "Tree" {
    primitive label,
    scalar parent,
    array children,
});

impl Tree {
    pub fn labeled(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Default::default()
        }
    }

    /// Adds `child` below `parent`, closing the cycle through `child.parent`.
    pub fn adopt(parent: &Shared<Tree>, child: Shared<Tree>) {
        child.borrow_mut().parent = Some(parent.clone());
        parent.borrow_mut().children.push(child);
    }

    /// Breaks the parent links below `tree` so the nodes can be dropped.
    pub fn dismantle(tree: &Shared<Tree>) {
        let children = std::mem::take(&mut tree.borrow_mut().children);
        tree.borrow_mut().parent = None;
        for child in &children {
            Tree::dismantle(child);
        }
    }
}

pub fn registry() -> Result<Registry, Error> {
    registry![Record, Container, Tree]
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
