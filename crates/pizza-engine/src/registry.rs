//! Suite arena and handles
//!
//! Suites live in a flat `Vec` indexed by position; parents and children
//! refer to each other by index. Handles handed to callers carry the id of
//! the engine that issued them, so a handle from another engine is caught
//! instead of silently indexing into the wrong arena.

use crate::case::{Hook, TestCase};
use crate::error::{EngineError, EngineResult};
use crate::suite::TestSuite;
use std::collections::HashSet;
use std::fmt;

/// Opaque handle to a registered suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuiteId {
    engine: u64,
    index: usize,
}

impl fmt::Display for SuiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "suite#{}@{}", self.index, self.engine)
    }
}

/// Opaque handle to a registered case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaseId {
    suite: SuiteId,
    index: usize,
}

impl CaseId {
    /// The suite the case belongs to
    pub fn suite(&self) -> SuiteId {
        self.suite
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case#{}/{}", self.index, self.suite)
    }
}

pub(crate) struct SuiteNode {
    pub name: String,
    pub parent: Option<usize>,
    pub setup: Option<Hook>,
    pub teardown: Option<Hook>,
    pub cases: Vec<TestCase>,
    pub children: Vec<usize>,
}

pub(crate) struct Registry {
    engine: u64,
    nodes: Vec<SuiteNode>,
    roots: Vec<usize>,
    released: bool,
}

impl Registry {
    pub fn new(engine: u64) -> Self {
        Self {
            engine,
            nodes: Vec::new(),
            roots: Vec::new(),
            released: false,
        }
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn node(&self, index: usize) -> &SuiteNode {
        &self.nodes[index]
    }

    pub fn suite_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn case_count(&self) -> usize {
        self.nodes.iter().map(|n| n.cases.len()).sum()
    }

    /// Map a handle to its arena index
    pub fn resolve(&self, id: SuiteId) -> EngineResult<usize> {
        if id.engine != self.engine {
            return Err(EngineError::UnknownSuite(id.to_string()));
        }
        if self.released {
            return Err(EngineError::InvalidHandle(id.to_string()));
        }
        if id.index >= self.nodes.len() {
            return Err(EngineError::UnknownSuite(id.to_string()));
        }
        Ok(id.index)
    }

    /// Suite names from the root down to `index`
    pub fn path(&self, index: usize) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            path.push(self.nodes[i].name.as_str());
            current = self.nodes[i].parent;
        }
        path.reverse();
        path
    }

    pub fn insert_root(&mut self, suite: TestSuite) -> EngineResult<SuiteId> {
        validate_tree(&suite)?;
        if self.roots.iter().any(|&r| self.nodes[r].name == suite.name) {
            return Err(EngineError::DuplicateName {
                kind: "suite",
                name: suite.name,
                scope: "the engine".to_string(),
            });
        }

        let index = self.insert_tree(suite, None);
        self.roots.push(index);
        Ok(self.handle(index))
    }

    pub fn insert_child(&mut self, parent: SuiteId, suite: TestSuite) -> EngineResult<SuiteId> {
        let parent = self.resolve(parent)?;
        validate_tree(&suite)?;
        let node = &self.nodes[parent];
        if node
            .children
            .iter()
            .any(|&c| self.nodes[c].name == suite.name)
        {
            return Err(EngineError::DuplicateName {
                kind: "suite",
                name: suite.name,
                scope: format!("suite '{}'", node.name),
            });
        }

        let index = self.insert_tree(suite, Some(parent));
        self.nodes[parent].children.push(index);
        Ok(self.handle(index))
    }

    pub fn insert_case(&mut self, suite: SuiteId, case: TestCase) -> EngineResult<CaseId> {
        let index = self.resolve(suite)?;
        if case.name().is_empty() {
            return Err(EngineError::EmptyName { kind: "case" });
        }

        let node = &mut self.nodes[index];
        if node.cases.iter().any(|c| c.name() == case.name()) {
            return Err(EngineError::DuplicateName {
                kind: "case",
                name: case.name().to_string(),
                scope: format!("suite '{}'", node.name),
            });
        }

        node.cases.push(case);
        Ok(CaseId {
            suite,
            index: node.cases.len() - 1,
        })
    }

    /// Drop every suite and case; outstanding handles become invalid
    pub fn release(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.released = true;
    }

    fn handle(&self, index: usize) -> SuiteId {
        SuiteId {
            engine: self.engine,
            index,
        }
    }

    /// Flatten a validated suite tree into the arena, pre-order
    fn insert_tree(&mut self, suite: TestSuite, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        self.nodes.push(SuiteNode {
            name: suite.name,
            parent,
            setup: suite.setup,
            teardown: suite.teardown,
            cases: suite.cases,
            children: Vec::new(),
        });

        for child in suite.suites {
            let child_index = self.insert_tree(child, Some(index));
            self.nodes[index].children.push(child_index);
        }
        index
    }
}

/// Check names in a suite tree before any of it is registered
fn validate_tree(suite: &TestSuite) -> EngineResult<()> {
    if suite.name.is_empty() {
        return Err(EngineError::EmptyName { kind: "suite" });
    }

    let mut case_names = HashSet::new();
    for case in &suite.cases {
        if case.name().is_empty() {
            return Err(EngineError::EmptyName { kind: "case" });
        }
        if !case_names.insert(case.name()) {
            return Err(EngineError::DuplicateName {
                kind: "case",
                name: case.name().to_string(),
                scope: format!("suite '{}'", suite.name),
            });
        }
    }

    let mut suite_names = HashSet::new();
    for child in &suite.suites {
        if !suite_names.insert(child.name.as_str()) {
            return Err(EngineError::DuplicateName {
                kind: "suite",
                name: child.name.clone(),
                scope: format!("suite '{}'", suite.name),
            });
        }
        validate_tree(child)?;
    }

    Ok(())
}
