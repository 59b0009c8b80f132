#![forbid(unsafe_code)]

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::sync::atomic::{self, AtomicU64};
use std::sync::{Arc, Weak};

use crate::error::GuardError;
use crate::guard_source::GuardSource;

/// A scope within which a guard's runtime check gets built.
///
/// The builder is chosen by [`GuardSource::select`]; create fns downcast it through
/// [`GuardBuilder::as_any_mut`] to reach their concrete builder.
pub trait GuardBuilder: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

type CreateFnBody = dyn Fn(&mut dyn GuardBuilder, &Guard) -> miette::Result<()> + Send + Sync;

static NEXT_CREATE_FN_ID: AtomicU64 = AtomicU64::new(0);

struct CreateFnInner {
    id: u64,
    name: &'static str,
    line: u32,
    body: Box<CreateFnBody>,
}

/// An interned guard-construction strategy.
///
/// Every call to [`CreateFn::new`] registers a new strategy with its own token; clones
/// share it. Guard identity compares tokens, never behaviour.
#[derive(Clone)]
pub struct CreateFn {
    inner: Arc<CreateFnInner>,
}

impl CreateFn {
    /// Register a strategy whose origin line is the caller's line.
    #[track_caller]
    pub fn new<F>(name: &'static str, body: F) -> Self
    where
        F: Fn(&mut dyn GuardBuilder, &Guard) -> miette::Result<()> + Send + Sync + 'static,
    {
        Self::with_line(name, Location::caller().line(), body)
    }

    pub fn with_line<F>(name: &'static str, line: u32, body: F) -> Self
    where
        F: Fn(&mut dyn GuardBuilder, &Guard) -> miette::Result<()> + Send + Sync + 'static,
    {
        let id = NEXT_CREATE_FN_ID.fetch_add(1, atomic::Ordering::Relaxed);
        Self {
            inner: Arc::new(CreateFnInner {
                id,
                name,
                line,
                body: Box::new(body),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn line(&self) -> u32 {
        self.inner.line
    }

    fn call(&self, builder: &mut dyn GuardBuilder, guard: &Guard) -> miette::Result<()> {
        (self.inner.body)(builder, guard)
    }
}

impl PartialEq for CreateFn {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for CreateFn {}

impl Hash for CreateFn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for CreateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateFn")
            .field("name", &self.inner.name)
            .field("id", &self.inner.id)
            .field("line", &self.inner.line)
            .finish()
    }
}

/// Non-owning handle to the runtime object a guard was compiled against.
#[derive(Clone)]
pub struct ObjectRef {
    target: Weak<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ObjectRef {
    pub fn new<T: Any + Send + Sync>(obj: &Arc<T>) -> Self {
        let weak: Weak<T> = Arc::downgrade(obj);
        let target: Weak<dyn Any + Send + Sync> = weak;
        Self {
            target,
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    pub fn upgrade(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.target.upgrade()
    }

    pub fn same_object(&self, other: &ObjectRef) -> bool {
        Weak::ptr_eq(&self.target, &other.target)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// Formatting only inspects the strong count, so it never extends the referent's life.
impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr = self.target.as_ptr().cast::<()>();
        if self.is_alive() {
            write!(f, "<weakref to '{}' at {:p}>", self.type_name, addr)
        } else {
            write!(f, "<weakref at {:p}; dead>", addr)
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("type_name", &self.type_name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// The class of a guarded object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GuardedClass {
    id: TypeId,
    name: &'static str,
}

impl GuardedClass {
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for GuardedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Metadata written by the check-compilation phase, for export only.
#[derive(Clone, Debug, Default)]
pub struct ExportInfo {
    pub guard_types: Vec<String>,
    pub code_list: Vec<String>,
    pub obj_weakref: Option<ObjectRef>,
    pub guarded_class: Option<GuardedClass>,
}

pub type GuardSortKey<'a> = (i16, usize, &'a str, u32, u64);

/// A recorded runtime assumption.
///
/// What `name` means is up to the create fn. Usually it is a [`crate::Source::name`]
/// expression evaluated against the frame to fetch the guarded object, but guards on
/// global interpreter state (grad mode, shape env) may carry an arbitrary name.
#[derive(Clone, Debug)]
pub struct Guard {
    name: String,
    source: Option<GuardSource>,
    create_fn: CreateFn,
    is_volatile: bool,
    export: ExportInfo,
}

impl Guard {
    pub fn new(
        name: impl Into<String>,
        source: GuardSource,
        create_fn: CreateFn,
        is_volatile: bool,
    ) -> Self {
        Self {
            name: name.into(),
            source: Some(source),
            create_fn,
            is_volatile,
            export: ExportInfo::default(),
        }
    }

    /// A guard on state that lives outside any frame scope.
    pub fn unsourced(name: impl Into<String>, create_fn: CreateFn) -> Self {
        Self {
            name: name.into(),
            source: None,
            create_fn,
            is_volatile: false,
            export: ExportInfo::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<GuardSource> {
        self.source
    }

    pub fn create_fn(&self) -> &CreateFn {
        &self.create_fn
    }

    pub fn is_volatile(&self) -> bool {
        self.is_volatile
    }

    pub fn export_info(&self) -> &ExportInfo {
        &self.export
    }

    pub fn sort_key(&self) -> GuardSortKey<'_> {
        (
            self.source.map_or(-1, |s| i16::from(s.ordinal())),
            self.name.len(),
            self.name.as_str(),
            self.create_fn.line(),
            self.create_fn.id(),
        )
    }

    pub fn is_nn_module(&self) -> bool {
        self.source.is_some_and(GuardSource::is_nn_module)
    }

    pub fn is_local(&self) -> bool {
        self.source.is_some_and(GuardSource::is_local)
    }

    /// Route to the builder for this guard's scope and run the create fn against it.
    pub fn create<'b>(
        &self,
        local_builder: &'b mut dyn GuardBuilder,
        global_builder: &'b mut dyn GuardBuilder,
    ) -> miette::Result<()> {
        let source = self.source.ok_or_else(|| GuardError::Unsourced {
            name: self.name.clone(),
        })?;
        let builder = source.select(local_builder, global_builder)?;
        self.create_fn.call(builder, self)
    }

    /// Record what the check compiler produced for this guard.
    ///
    /// May be called once per pass that reinforces the guard. The guarded class and
    /// object must agree with earlier calls; on a conflict nothing is recorded.
    pub fn set_export_info(
        &mut self,
        guard_type: impl Into<String>,
        guarded_class: Option<GuardedClass>,
        code_list: Vec<String>,
        obj_weakref: Option<ObjectRef>,
    ) -> Result<(), GuardError> {
        if let Some(existing) = self.export.guarded_class {
            if guarded_class != Some(existing) {
                return Err(GuardError::GuardedClassMismatch {
                    name: self.name.clone(),
                    existing: existing.name().to_string(),
                    incoming: guarded_class
                        .map_or_else(|| "None".to_string(), |c| c.name().to_string()),
                });
            }
        }

        if let Some(existing) = &self.export.obj_weakref {
            let same = obj_weakref.as_ref().is_some_and(|o| o.same_object(existing));
            if !same {
                return Err(GuardError::GuardedObjectMismatch {
                    name: self.name.clone(),
                });
            }
        }

        self.export.guard_types.push(guard_type.into());
        self.export.guarded_class = guarded_class;
        self.export.code_list.extend(code_list);
        self.export.obj_weakref = obj_weakref;
        Ok(())
    }
}

impl PartialEq for Guard {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.source == other.source && self.create_fn == other.create_fn
    }
}

impl Eq for Guard {}

impl Hash for Guard {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.source.hash(state);
        self.create_fn.hash(state);
    }
}

impl PartialOrd for Guard {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Guard {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self.source.map_or("", GuardSource::as_str);
        let obj = self
            .export
            .obj_weakref
            .as_ref()
            .map_or_else(|| "None".to_string(), ObjectRef::to_string);
        let class = self
            .export
            .guarded_class
            .map_or_else(|| "None".to_string(), |c| c.to_string());

        writeln!(f, "{source} {:?} {}", self.name, self.create_fn.name())?;
        writeln!(f, "{{")?;
        writeln!(f, "    'guard_types': {:?},", self.export.guard_types)?;
        writeln!(f, "    'code': {:?},", self.export.code_list)?;
        writeln!(f, "    'obj_weakref': {obj}")?;
        writeln!(f, "    'guarded_class': {class}")?;
        write!(f, "}}")
    }
}
