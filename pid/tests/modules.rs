use pid::{Bootstrap, Component, Registry, ResolveError, ResolveOptions, Tag};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct TestProvider;

#[derive(Clone, Default)]
struct Store(Arc<Mutex<HashMap<&'static str, Arc<TestProvider>>>>);

impl Store {
    fn put(&self, key: &'static str, value: Arc<TestProvider>) {
        self.0.lock().unwrap().insert(key, value);
    }

    fn get(&self, key: &'static str) -> Arc<TestProvider> {
        self.0.lock().unwrap().get(key).cloned().unwrap()
    }
}

fn leaf<T>() -> Component<T>
where
    T: Default + Send + Sync + 'static,
{
    Component::injectable().factory(|_| Ok(T::default()))
}

/// A module depending on `TestProvider` and recording it under `key`.
fn recording<T>(store: &Store, key: &'static str) -> Component<T>
where
    T: Default + Send + Sync + 'static,
{
    let store = store.clone();
    Component::module()
        .dependency::<TestProvider>("provider")
        .factory(move |args| {
            store.put(key, args.get("provider")?);
            Ok(T::default())
        })
}

fn eager() -> ResolveOptions {
    ResolveOptions {
        eager_providers: true,
        ..Default::default()
    }
}

#[test]
fn test_provider() {
    struct TestModule {
        provider: Arc<TestProvider>,
    }

    let mut registry = Registry::new();
    registry.register(leaf::<TestProvider>()).register(
        Component::<TestModule>::module()
            .provider::<TestProvider>()
            .dependency::<TestProvider>("provider")
            .factory(|args| {
                Ok(TestModule {
                    provider: args.get("provider")?,
                })
            }),
    );

    let container = registry.bootstrap::<TestModule>().unwrap();
    let module = container.resolve(Tag::none()).unwrap();
    // Held by the module and by the instance pool.
    assert_eq!(Arc::strong_count(&module.provider), 2);
}

#[test]
fn test_exports() {
    #[derive(Default)]
    struct ExportModule;
    #[derive(Default)]
    struct TestModule;

    let store = Store::default();
    let mut registry = Registry::new();
    registry
        .register(leaf::<TestProvider>())
        .register(
            recording::<ExportModule>(&store, "common")
                .provider::<TestProvider>()
                .export::<TestProvider>(),
        )
        .register(recording::<TestModule>(&store, "inherited").import::<ExportModule>());

    Bootstrap::resolve::<TestModule>(&registry).unwrap();
    assert!(Arc::ptr_eq(&store.get("common"), &store.get("inherited")));
}

#[test]
fn test_module_exports() {
    #[derive(Default)]
    struct ExportModuleTwo;
    struct ExportModule;
    #[derive(Default)]
    struct TestModule;

    let store = Store::default();
    let mut registry = Registry::new();
    registry
        .register(leaf::<TestProvider>())
        .register(
            recording::<ExportModuleTwo>(&store, "common")
                .provider::<TestProvider>()
                .export::<TestProvider>(),
        )
        .register(
            Component::<ExportModule>::module()
                .import::<ExportModuleTwo>()
                .export::<ExportModuleTwo>()
                .factory(|_| Ok(ExportModule)),
        )
        .register(recording::<TestModule>(&store, "inherited").import::<ExportModule>());

    Bootstrap::resolve::<TestModule>(&registry).unwrap();
    assert!(Arc::ptr_eq(&store.get("common"), &store.get("inherited")));
}

#[test]
fn test_injectable_does_not_export() {
    #[derive(Default)]
    struct ExportModuleTwo;
    #[derive(Default)]
    struct NotAModule;
    #[derive(Default)]
    struct TestModule;

    let store = Store::default();
    let mut registry = Registry::new();
    registry
        .register(leaf::<TestProvider>())
        .register(
            recording::<ExportModuleTwo>(&store, "common")
                .provider::<TestProvider>()
                .export::<TestProvider>(),
        )
        .register(
            leaf::<NotAModule>()
                .import::<ExportModuleTwo>()
                .export::<ExportModuleTwo>(),
        )
        .register(recording::<TestModule>(&store, "inherited").import::<NotAModule>());

    assert!(matches!(
        Bootstrap::resolve::<TestModule>(&registry),
        Err(ResolveError::CannotResolveDependency { .. })
    ));
}

#[test]
fn test_rhombus() {
    #[derive(Default)]
    struct TopModule;
    #[derive(Default)]
    struct RightModule;
    #[derive(Default)]
    struct LeftModule;
    struct TestModule;

    let store = Store::default();
    let mut registry = Registry::new();
    registry
        .register(leaf::<TestProvider>())
        .register(
            recording::<TopModule>(&store, "common")
                .provider::<TestProvider>()
                .export::<TestProvider>(),
        )
        .register(recording::<RightModule>(&store, "right").import::<TopModule>())
        .register(recording::<LeftModule>(&store, "left").import::<TopModule>())
        .register(
            Component::<TestModule>::module()
                .import::<RightModule>()
                .import::<LeftModule>()
                .factory(|_| Ok(TestModule)),
        );

    let container = registry.bootstrap::<TestModule>().unwrap();
    container.resolve(Tag::none()).unwrap();
    assert!(Arc::ptr_eq(&store.get("common"), &store.get("left")));
    assert!(Arc::ptr_eq(&store.get("common"), &store.get("right")));
    // One node per module type: four modules and a single provider node.
    assert_eq!(container.nodes(), 5);
    assert_eq!(container.instances(), 5);
}

#[test]
fn test_use_inherit() {
    #[derive(Default)]
    struct TestModule;
    struct ProviderWithDep;

    for inverted in [false, true] {
        let store = Store::default();
        let with_dep = {
            let store = store.clone();
            move |args: &pid::Arguments| -> Result<ProviderWithDep, pid::StdError> {
                store.put("provider", args.get("provider")?);
                Ok(ProviderWithDep)
            }
        };

        let module = if inverted {
            recording::<TestModule>(&store, "module")
                .provider::<ProviderWithDep>()
                .provider::<TestProvider>()
        } else {
            recording::<TestModule>(&store, "module")
                .provider::<TestProvider>()
                .provider::<ProviderWithDep>()
        };
        let mut registry = Registry::new();
        registry
            .set_options(eager())
            .register(leaf::<TestProvider>())
            .register(
                Component::<ProviderWithDep>::injectable()
                    .dependency::<TestProvider>("provider")
                    .factory(with_dep),
            )
            .register(module);

        Bootstrap::resolve::<TestModule>(&registry).unwrap();
        assert!(Arc::ptr_eq(&store.get("provider"), &store.get("module")));
    }
}

#[test]
fn test_lazy_providers_are_not_built() {
    struct Unused;
    #[derive(Default)]
    struct TestModule;

    let store = Store::default();
    let mut registry = Registry::new();
    registry
        .register(leaf::<TestProvider>())
        .register(
            Component::<Unused>::injectable()
                .factory(|_| -> Result<Unused, pid::StdError> { panic!("must not be built") }),
        )
        .register(
            recording::<TestModule>(&store, "module")
                .provider::<TestProvider>()
                .provider::<Unused>(),
        );

    let container = registry.bootstrap::<TestModule>().unwrap();
    container.resolve(Tag::none()).unwrap();
    assert_eq!(container.instances(), 2);
}

#[test]
fn test_reassign() {
    #[derive(Default)]
    struct TestModule;
    struct ReassignProvider;

    for inverted in [false, true] {
        let store = Store::default();
        let reassign = {
            let store = store.clone();
            Component::<ReassignProvider>::injectable()
                .provider::<TestProvider>()
                .dependency::<TestProvider>("provider")
                .factory(move |args| {
                    store.put("reassign", args.get("provider")?);
                    Ok(ReassignProvider)
                })
        };
        let module = if inverted {
            recording::<TestModule>(&store, "module")
                .provider::<ReassignProvider>()
                .provider::<TestProvider>()
        } else {
            recording::<TestModule>(&store, "module")
                .provider::<TestProvider>()
                .provider::<ReassignProvider>()
        };
        let mut registry = Registry::new();
        registry
            .set_options(eager())
            .register(leaf::<TestProvider>())
            .register(reassign)
            .register(module);

        Bootstrap::resolve::<TestModule>(&registry).unwrap();
        assert!(!Arc::ptr_eq(&store.get("reassign"), &store.get("module")));
    }
}

#[test]
fn test_module_reassign() {
    #[derive(Default)]
    struct ExportModuleTwo;
    struct ExportModule;
    #[derive(Default)]
    struct TestModule;

    let store = Store::default();
    let mut registry = Registry::new();
    registry
        .register(leaf::<TestProvider>())
        .register(
            recording::<ExportModuleTwo>(&store, "common")
                .provider::<TestProvider>()
                .export::<TestProvider>(),
        )
        .register(
            Component::<ExportModule>::module()
                .import::<ExportModuleTwo>()
                .export::<ExportModuleTwo>()
                .factory(|_| Ok(ExportModule)),
        )
        .register(
            recording::<TestModule>(&store, "inherited")
                .provider::<TestProvider>()
                .import::<ExportModule>(),
        );

    Bootstrap::resolve::<TestModule>(&registry).unwrap();
    assert!(!Arc::ptr_eq(&store.get("common"), &store.get("inherited")));
}

#[test]
fn test_reassign_inherit() {
    #[derive(Default)]
    struct TestModule;
    #[derive(Default)]
    struct ReassignProvider;
    struct InheritProvider;

    for inverted in [false, true] {
        let store = Store::default();
        let inherit = {
            let store = store.clone();
            Component::<InheritProvider>::injectable()
                .dependency::<TestProvider>("provider")
                .factory(move |args| {
                    store.put("inherit", args.get("provider")?);
                    Ok(InheritProvider)
                })
        };
        let reassign = if inverted {
            leaf::<ReassignProvider>()
                .provider::<InheritProvider>()
                .provider::<TestProvider>()
        } else {
            leaf::<ReassignProvider>()
                .provider::<TestProvider>()
                .provider::<InheritProvider>()
        };
        let mut registry = Registry::new();
        registry
            .set_options(eager())
            .register(leaf::<TestProvider>())
            .register(inherit)
            .register(reassign)
            .register(
                recording::<TestModule>(&store, "module")
                    .provider::<ReassignProvider>()
                    .provider::<TestProvider>(),
            );

        Bootstrap::resolve::<TestModule>(&registry).unwrap();
        assert!(!Arc::ptr_eq(&store.get("inherit"), &store.get("module")));
    }
}

#[test]
fn test_multiple_exports() {
    #[derive(Default)]
    struct ExportModuleOne;
    #[derive(Default)]
    struct ExportModuleTwo;
    #[derive(Default)]
    struct TestModule;

    for inverted in [false, true] {
        let store = Store::default();
        let module = if inverted {
            recording::<TestModule>(&store, "inherited")
                .import::<ExportModuleTwo>()
                .import::<ExportModuleOne>()
        } else {
            recording::<TestModule>(&store, "inherited")
                .import::<ExportModuleOne>()
                .import::<ExportModuleTwo>()
        };
        let mut registry = Registry::new();
        registry
            .register(leaf::<TestProvider>())
            .register(
                recording::<ExportModuleOne>(&store, "one")
                    .provider::<TestProvider>()
                    .export::<TestProvider>(),
            )
            .register(
                recording::<ExportModuleTwo>(&store, "two")
                    .provider::<TestProvider>()
                    .export::<TestProvider>(),
            )
            .register(module);

        Bootstrap::resolve::<TestModule>(&registry).unwrap();
        let (winner, loser) = if inverted {
            ("one", "two")
        } else {
            ("two", "one")
        };
        assert!(Arc::ptr_eq(&store.get("inherited"), &store.get(winner)));
        assert!(!Arc::ptr_eq(&store.get("inherited"), &store.get(loser)));
        assert!(!Arc::ptr_eq(&store.get("one"), &store.get("two")));
    }
}

#[test]
fn test_reexported_modules_last_import_wins() {
    #[derive(Default)]
    struct ExportModuleOne;
    #[derive(Default)]
    struct ExportModuleTwo;
    struct MiddleModule;
    #[derive(Default)]
    struct TestModule;

    for inverted in [false, true] {
        let store = Store::default();
        let middle = if inverted {
            Component::<MiddleModule>::module()
                .import::<ExportModuleTwo>()
                .import::<ExportModuleOne>()
        } else {
            Component::<MiddleModule>::module()
                .import::<ExportModuleOne>()
                .import::<ExportModuleTwo>()
        };
        let mut registry = Registry::new();
        registry
            .register(leaf::<TestProvider>())
            .register(
                recording::<ExportModuleOne>(&store, "one")
                    .provider::<TestProvider>()
                    .export::<TestProvider>(),
            )
            .register(
                recording::<ExportModuleTwo>(&store, "two")
                    .provider::<TestProvider>()
                    .export::<TestProvider>(),
            )
            .register(
                middle
                    .export::<ExportModuleOne>()
                    .export::<ExportModuleTwo>()
                    .factory(|_| Ok(MiddleModule)),
            )
            .register(recording::<TestModule>(&store, "inherited").import::<MiddleModule>());

        Bootstrap::resolve::<TestModule>(&registry).unwrap();
        let winner = if inverted { "one" } else { "two" };
        assert!(Arc::ptr_eq(&store.get("inherited"), &store.get(winner)));
    }
}

#[test]
fn test_reexported_module_shadowed_by_own_provider() {
    #[derive(Default)]
    struct ExportModuleOne;
    #[derive(Default)]
    struct OwnModule;
    #[derive(Default)]
    struct TestModule;

    let store = Store::default();
    let mut registry = Registry::new();
    registry
        .register(leaf::<TestProvider>())
        .register(
            recording::<ExportModuleOne>(&store, "one")
                .provider::<TestProvider>()
                .export::<TestProvider>(),
        )
        .register(
            recording::<OwnModule>(&store, "own")
                .import::<ExportModuleOne>()
                .provider::<TestProvider>()
                .export::<ExportModuleOne>()
                .export::<TestProvider>(),
        )
        .register(recording::<TestModule>(&store, "inherited").import::<OwnModule>());

    Bootstrap::resolve::<TestModule>(&registry).unwrap();
    assert!(Arc::ptr_eq(&store.get("inherited"), &store.get("own")));
    assert!(!Arc::ptr_eq(&store.get("inherited"), &store.get("one")));
}

#[test]
fn test_not_injectable_provider() {
    struct Unregistered;
    struct TestModule;

    let mut registry = Registry::new();
    registry.register(
        Component::<TestModule>::module()
            .provider::<Unregistered>()
            .factory(|_| Ok(TestModule)),
    );

    match Bootstrap::resolve::<TestModule>(&registry) {
        Err(ResolveError::ClassIsNotInjectable { component }) => {
            assert!(component.ends_with("Unregistered"));
        }
        _ => panic!("expected ClassIsNotInjectable"),
    }
}

#[test]
fn test_not_injectable_module() {
    struct SecondModule;
    struct TestModule;

    let mut registry = Registry::new();
    registry.register(
        Component::<TestModule>::module()
            .import::<SecondModule>()
            .factory(|_| Ok(TestModule)),
    );

    assert!(matches!(
        Bootstrap::resolve::<TestModule>(&registry),
        Err(ResolveError::ClassIsNotInjectable { .. })
    ));
}

#[test]
fn test_not_injectable_root() {
    struct TestModule;

    let registry = Registry::new();
    assert!(!registry.is_injectable::<TestModule>());
    assert!(matches!(
        registry.bootstrap::<TestModule>(),
        Err(ResolveError::ClassIsNotInjectable { .. })
    ));
}

#[test]
fn test_forbidden_exports() {
    struct ExportModule;
    #[derive(Default)]
    struct TestModule;

    let store = Store::default();
    let mut registry = Registry::new();
    registry
        .register(leaf::<TestProvider>())
        .register(
            Component::<ExportModule>::module()
                .provider::<TestProvider>()
                .factory(|_| Ok(ExportModule)),
        )
        .register(recording::<TestModule>(&store, "inherited").import::<ExportModule>());

    let err = Bootstrap::resolve::<TestModule>(&registry).err().unwrap();
    match &err {
        ResolveError::CannotResolveDependency {
            parameter, chain, ..
        } => {
            assert_eq!(*parameter, "provider");
            assert_eq!(chain.len(), 1);
        }
        _ => panic!("expected CannotResolveDependency, got {err}"),
    }
    assert!(err.to_string().starts_with("Cannot resolve dependency:"));
}

#[test]
fn test_export_undefined() {
    struct UndefinedProvider;
    struct ExportModule;
    #[derive(Default)]
    struct TestModule;

    let store = Store::default();
    let mut registry = Registry::new();
    registry
        .register(leaf::<TestProvider>())
        .register(Component::<UndefinedProvider>::injectable().factory(|_| Ok(UndefinedProvider)))
        .register(
            Component::<ExportModule>::module()
                .provider::<TestProvider>()
                .export::<TestProvider>()
                .export::<UndefinedProvider>()
                .factory(|_| Ok(ExportModule)),
        )
        .register(recording::<TestModule>(&store, "inherited").import::<ExportModule>());

    match Bootstrap::resolve::<TestModule>(&registry) {
        Err(ResolveError::UndefinedExport { exports, .. }) => {
            assert_eq!(exports.len(), 1);
            assert!(exports[0].ends_with("UndefinedProvider"));
        }
        _ => panic!("expected UndefinedExport"),
    }
}

#[test]
fn test_export_not_imported_module() {
    struct OtherModule;
    struct ExportModule;

    let mut registry = Registry::new();
    registry
        .register(Component::<OtherModule>::module().factory(|_| Ok(OtherModule)))
        .register(
            Component::<ExportModule>::module()
                .export::<OtherModule>()
                .factory(|_| Ok(ExportModule)),
        );

    assert!(matches!(
        Bootstrap::resolve::<ExportModule>(&registry),
        Err(ResolveError::UndefinedExport { .. })
    ));
}

#[test]
fn test_nested_provider_scope() {
    struct SomeDep;
    struct FourthDep;
    struct ThirdDep;
    #[derive(Default)]
    struct SecondModule;
    #[derive(Default)]
    struct RootModule;

    let store = Store::default();
    let third = {
        let store = store.clone();
        Component::<ThirdDep>::injectable()
            .provider::<TestProvider>()
            .dependency::<FourthDep>("fourth")
            .dependency::<TestProvider>("provider")
            .factory(move |args| {
                store.put("third", args.get("provider")?);
                Ok(ThirdDep)
            })
    };
    let mut registry = Registry::new();
    registry
        .register(leaf::<TestProvider>())
        .register(Component::<SomeDep>::injectable().factory(|_| Ok(SomeDep)))
        .register(
            Component::<FourthDep>::injectable()
                .dependency::<SomeDep>("some")
                .factory(|_| Ok(FourthDep)),
        )
        .register(third)
        .register(
            recording::<SecondModule>(&store, "second")
                .provider::<TestProvider>()
                .export::<TestProvider>(),
        )
        .register(
            recording::<RootModule>(&store, "root")
                .import::<SecondModule>()
                .provider::<SomeDep>()
                .provider::<ThirdDep>()
                .provider::<FourthDep>()
                .dependency::<SomeDep>("some")
                .dependency::<ThirdDep>("third"),
        );

    Bootstrap::resolve::<RootModule>(&registry).unwrap();
    // The root sees the exported instance, `ThirdDep` its own declaration.
    assert!(Arc::ptr_eq(&store.get("root"), &store.get("second")));
    assert!(!Arc::ptr_eq(&store.get("root"), &store.get("third")));
}
