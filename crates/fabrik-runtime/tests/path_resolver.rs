use std::sync::Arc;
use std::thread;

use fabrik_runtime::bridge::PathResolver;
use fabrik_runtime::ua::{ns0, SimulatedAddressSpace, UaServices};
use fabrik_runtime::RuntimeError;

fn resolver_over(space: &Arc<SimulatedAddressSpace>) -> PathResolver {
    let services: Arc<dyn UaServices> = space.clone();
    PathResolver::new(services, 1)
}

#[test]
fn create_then_resolve_round_trips() {
    let space = Arc::new(SimulatedAddressSpace::new());
    let resolver = resolver_over(&space);

    let created = resolver
        .resolve("/Objects/A/B/C", true)
        .expect("create path");
    let resolved = resolver
        .resolve("/Objects/A/B/C", false)
        .expect("resolve path");
    assert_eq!(created, resolved);
}

#[test]
fn create_adds_exactly_the_missing_folders() {
    let space = Arc::new(SimulatedAddressSpace::new());
    let resolver = resolver_over(&space);

    let before = space.node_count();
    let c = resolver
        .resolve("/Objects/A/B/C", true)
        .expect("create path");
    assert_eq!(space.node_count(), before + 3);

    let b = resolver.resolve("/Objects/A/B", false).expect("resolve B");
    assert_eq!(space.parent_of(&c), Some(b.clone()));

    // extending an existing prefix only creates the new leaf
    let before = space.node_count();
    let d = resolver
        .resolve("/Objects/A/B/D", true)
        .expect("create sibling");
    assert_eq!(space.node_count(), before + 1);
    assert_eq!(space.parent_of(&d), Some(b));
}

#[test]
fn root_spellings_and_trailing_slashes_are_accepted() {
    let space = Arc::new(SimulatedAddressSpace::new());
    let resolver = resolver_over(&space);

    let created = resolver.resolve("/Objects/A", true).expect("create A");
    assert_eq!(
        resolver.resolve("0:Objects/A", false).expect("synonym root"),
        created
    );
    assert_eq!(
        resolver.resolve("/Objects/A///", false).expect("trailing slashes"),
        created
    );
    assert_eq!(
        resolver.resolve("/Objects", false).expect("bare root"),
        ns0::OBJECTS_FOLDER
    );
}

#[test]
fn malformed_and_missing_paths_fail() {
    let space = Arc::new(SimulatedAddressSpace::new());
    let resolver = resolver_over(&space);

    assert!(matches!(
        resolver.resolve("", false),
        Err(RuntimeError::PathMalformed(_))
    ));
    assert!(matches!(
        resolver.resolve("/Widgets/A", true),
        Err(RuntimeError::PathNotRooted(_))
    ));
    assert!(matches!(
        resolver.resolve("/Objects/missing", false),
        Err(RuntimeError::NodeNotFound(_))
    ));
}

#[test]
fn concurrent_creates_yield_one_node() {
    let space = Arc::new(SimulatedAddressSpace::new());
    let resolver = Arc::new(resolver_over(&space));

    let mut workers = Vec::new();
    for _ in 0..4 {
        let resolver = resolver.clone();
        workers.push(thread::spawn(move || {
            resolver.resolve("/Objects/a/b", true).expect("create path")
        }));
    }
    let ids: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().expect("worker exits"))
        .collect();
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));

    // no duplicate siblings anywhere along the path
    let top: Vec<_> = space.children_of(&ns0::OBJECTS_FOLDER);
    assert_eq!(top.len(), 1);
    assert_eq!(space.children_of(&top[0]).len(), 1);
}
