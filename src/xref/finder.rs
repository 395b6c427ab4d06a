//! Query orchestration: scan, group, decompile, locate.
//!
//! [`UsagesFinder`] ties the pipeline together. A query scans the candidate scope
//! for hits, groups the hits by the root declaration that contains them, decompiles
//! each root once (through the shared cache) and locates every hit's span in the
//! decompiled text. Groups are processed on a dedicated rayon pool whose width is
//! capped by [`QueryOptions::max_parallel_groups`], since decompilation dominates
//! both time and memory.
//!
//! # Error recovery
//!
//! Hits whose containing root cannot be addressed (constructed types, unresolvable
//! declaring chains) are dropped silently so one exotic hit never sinks a query.
//! Decompilation failures and cancellation propagate.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    analysis::{
        field::FieldUsageScanner, method::MethodUsageScanner, property::AccessorUsageScanner,
        types::ImplementationScanner, types::TypeUsageScanner, AnalyzerContext, Hit, QueryOptions,
        ScopeProvider,
    },
    decompiler::{
        ast::{TextLocation, TextSpan},
        cache::DecompilationCache,
        Decompilation, Decompiler,
    },
    metadata::{
        handle::EntityHandle,
        module::Module,
        registry::ModuleRegistry,
        token::TABLE_METHOD_DEF,
        typesystem::{MemberKind, TypeEntryRc},
    },
    xref::{
        locators,
        path::metadata_file_path,
        usage::{sort_usages, Usage},
    },
    Error, Result,
};

/// Deepest nesting of type declarations the root walk will follow.
const MAX_NESTING_DEPTH: usize = 64;

/// Hits that share a containing root declaration, processed as one unit.
struct HitGroup {
    module: Arc<Module>,
    root: TypeEntryRc,
    hits: Vec<Hit>,
}

/// What the query is looking for, which decides how hits map to spans.
#[derive(Clone, Copy)]
enum QueryShape {
    /// Body references to one of the needle members
    Member,
    /// Type mentions in signatures, base lists and bodies
    Type,
    /// The hit's own declaration
    Declaration,
}

/// Cross-reference query entry point.
///
/// One finder serves a workspace: the registry holds its loaded modules, the
/// cache its decompiled roots, and `project` names the requesting project in
/// virtual document paths. All queries on one finder share the cache.
pub struct UsagesFinder {
    registry: Arc<ModuleRegistry>,
    cache: Arc<DecompilationCache>,
    decompiler: Arc<dyn Decompiler>,
    project: String,
}

impl UsagesFinder {
    /// Creates a finder over `registry` rendering through `decompiler`.
    pub fn new(
        registry: Arc<ModuleRegistry>,
        decompiler: Arc<dyn Decompiler>,
        project: impl Into<String>,
    ) -> Self {
        UsagesFinder {
            registry,
            cache: Arc::new(DecompilationCache::new()),
            decompiler,
            project: project.into(),
        }
    }

    /// The decompilation cache shared by this finder's queries
    #[must_use]
    pub fn cache(&self) -> &Arc<DecompilationCache> {
        &self.cache
    }

    /// Finds every usage of the method `target` within `scope`.
    ///
    /// # Errors
    /// [`Error::Cancelled`] on cancellation, [`Error::Decompilation`] if a
    /// containing root fails to render.
    pub fn find_method_usages(
        &self,
        target: EntityHandle,
        scope: &dyn ScopeProvider,
        options: &QueryOptions,
    ) -> Result<Vec<Usage>> {
        let context = AnalyzerContext::new(self.registry.clone());
        let types = scope.scope_types();
        let hits =
            MethodUsageScanner::new(&context).scan(target, &types, &options.cancellation)?;
        self.collect(hits, vec![target], QueryShape::Member, target, options)
    }

    /// Finds every usage of the field `target` within `scope`, honoring the
    /// access filter in `options`.
    ///
    /// # Errors
    /// Same failure modes as [`UsagesFinder::find_method_usages`].
    pub fn find_field_usages(
        &self,
        target: EntityHandle,
        scope: &dyn ScopeProvider,
        options: &QueryOptions,
    ) -> Result<Vec<Usage>> {
        let context = AnalyzerContext::new(self.registry.clone());
        let types = scope.scope_types();
        let hits = FieldUsageScanner::new(&context).scan(
            target,
            options.field_access,
            &types,
            &options.cancellation,
        )?;
        self.collect(hits, vec![target], QueryShape::Member, target, options)
    }

    /// Finds every usage of the property `target` within `scope`.
    ///
    /// # Errors
    /// Additionally [`Error::UnresolvedEntity`] if `target` is not a known
    /// property.
    pub fn find_property_usages(
        &self,
        target: EntityHandle,
        scope: &dyn ScopeProvider,
        options: &QueryOptions,
    ) -> Result<Vec<Usage>> {
        let entry = self
            .registry
            .property_entry(target)
            .ok_or(Error::UnresolvedEntity(target.token))?;
        let mut needles = vec![target];
        needles.extend(entry.accessors());

        let context = AnalyzerContext::new(self.registry.clone());
        let types = scope.scope_types();
        let hits = AccessorUsageScanner::new(&context).scan_property(
            target,
            &types,
            &options.cancellation,
        )?;
        self.collect(hits, needles, QueryShape::Member, target, options)
    }

    /// Finds every usage of the event `target` within `scope`.
    ///
    /// # Errors
    /// Additionally [`Error::UnresolvedEntity`] if `target` is not a known
    /// event.
    pub fn find_event_usages(
        &self,
        target: EntityHandle,
        scope: &dyn ScopeProvider,
        options: &QueryOptions,
    ) -> Result<Vec<Usage>> {
        let entry = self
            .registry
            .event_entry(target)
            .ok_or(Error::UnresolvedEntity(target.token))?;
        let mut needles = vec![target];
        needles.extend(entry.accessors());

        let context = AnalyzerContext::new(self.registry.clone());
        let types = scope.scope_types();
        let hits =
            AccessorUsageScanner::new(&context).scan_event(target, &types, &options.cancellation)?;
        self.collect(hits, needles, QueryShape::Member, target, options)
    }

    /// Finds every declaration within `scope` that mentions the type `target`.
    ///
    /// # Errors
    /// Same failure modes as [`UsagesFinder::find_method_usages`].
    pub fn find_type_usages(
        &self,
        target: EntityHandle,
        scope: &dyn ScopeProvider,
        options: &QueryOptions,
    ) -> Result<Vec<Usage>> {
        let context = AnalyzerContext::new(self.registry.clone());
        let types = scope.scope_types();
        let hits = TypeUsageScanner::new(&context).scan(
            target,
            &types,
            options.scan_bodies,
            &options.cancellation,
        )?;
        self.collect(hits, Vec::new(), QueryShape::Type, target, options)
    }

    /// Finds the types deriving from a target type, or the methods overriding a
    /// target method, reported at their declarations.
    ///
    /// # Errors
    /// [`Error::UnresolvedEntity`] if `target` is neither a type nor a method
    /// token, plus the usual query failure modes.
    pub fn find_implementations(
        &self,
        target: EntityHandle,
        scope: &dyn ScopeProvider,
        options: &QueryOptions,
    ) -> Result<Vec<Usage>> {
        let context = AnalyzerContext::new(self.registry.clone());
        let types = scope.scope_types();
        let scanner = ImplementationScanner::new(&context);
        let hits = if target.token.is_type_kind() {
            scanner.scan_type(target, &types, &options.cancellation)?
        } else if target.token.table() == TABLE_METHOD_DEF {
            scanner.scan_method(target, &types, &options.cancellation)?
        } else {
            return Err(Error::UnresolvedEntity(target.token));
        };
        self.collect(hits, Vec::new(), QueryShape::Declaration, target, options)
    }

    /// Locates the declaration of `target` in its decompiled document.
    ///
    /// Returns `Ok(None)` when the entity has no addressable root, which happens
    /// for members of constructed types.
    ///
    /// # Errors
    /// [`Error::UnresolvedEntity`] if `target` is unknown,
    /// [`Error::Decompilation`] if its root fails to render.
    pub fn find_declaration(&self, target: EntityHandle) -> Result<Option<Usage>> {
        let (declaring, kind, name) = self.entity_info(target)?;
        let Some(root) = self.containing_root(declaring) else {
            return Ok(None);
        };
        let Some(module) = self.registry.module(root.handle.module) else {
            return Ok(None);
        };

        let unit = self
            .cache
            .get_or_decompile(&module, root.handle.token, self.decompiler.as_ref())?;
        let file = metadata_file_path(&self.project, module.assembly_name(), &root.name);
        let span = locators::find_declaration(&unit.tree, target).unwrap_or_else(min_span);
        let excerpt = unit.excerpt(&span);

        Ok(Some(Usage {
            assembly: module.assembly_name().to_string(),
            project: self.project.clone(),
            file,
            span,
            containing_type: root.full_name(),
            containing_type_handle: root.handle,
            kind,
            member: name,
            excerpt,
        }))
    }

    /// Groups hits by containing root, renders each root once and maps every
    /// hit to a [`Usage`]. The returned list is sorted by document and
    /// position.
    fn collect(
        &self,
        hits: Vec<Hit>,
        needles: Vec<EntityHandle>,
        shape: QueryShape,
        target: EntityHandle,
        options: &QueryOptions,
    ) -> Result<Vec<Usage>> {
        let groups = self.group_by_root(hits);
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.max_parallel_groups.max(1))
            .build()
            .map_err(|e| Error::Malformed(format!("failed to build query pool: {e}")))?;

        let collected: boxcar::Vec<Usage> = boxcar::Vec::new();
        pool.install(|| {
            groups.par_iter().try_for_each(|group| {
                if options.cancellation.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                let unit = self.cache.get_or_decompile(
                    &group.module,
                    group.root.handle.token,
                    self.decompiler.as_ref(),
                )?;
                let file = metadata_file_path(
                    &self.project,
                    group.module.assembly_name(),
                    &group.root.name,
                );
                let containing_type = group.root.full_name();
                for hit in &group.hits {
                    for span in locate_hit(&unit, hit, target, &needles, shape) {
                        collected.push(Usage {
                            assembly: group.module.assembly_name().to_string(),
                            project: self.project.clone(),
                            file: file.clone(),
                            span,
                            containing_type: containing_type.clone(),
                            containing_type_handle: group.root.handle,
                            kind: hit.kind(),
                            member: hit.name().to_string(),
                            excerpt: unit.excerpt(&span),
                        });
                    }
                }
                Ok(())
            })
        })?;

        let mut usages: Vec<Usage> = collected.into_iter().collect();
        sort_usages(&mut usages);
        Ok(usages)
    }

    /// Buckets hits by their containing root declaration, dropping hits with
    /// no addressable root. Bucket order follows first appearance, keeping the
    /// grouping deterministic for a given scan order.
    fn group_by_root(&self, hits: Vec<Hit>) -> Vec<HitGroup> {
        let mut index: HashMap<(u32, u32), usize> = HashMap::new();
        let mut groups: Vec<HitGroup> = Vec::new();

        for hit in hits {
            let Some(root) = self.containing_root(hit.declaring_type()) else {
                continue;
            };
            let Some(module) = self.registry.module(root.handle.module) else {
                continue;
            };
            let key = (root.handle.module.0, root.handle.token.value());
            match index.get(&key) {
                Some(&at) => groups[at].hits.push(hit),
                None => {
                    index.insert(key, groups.len());
                    groups.push(HitGroup {
                        module,
                        root,
                        hits: vec![hit],
                    });
                }
            }
        }
        groups
    }

    /// Walks the declaring chain of a type up to its root declaration.
    ///
    /// Returns `None` for constructed types (no definition to decompile), for
    /// broken declaring chains and for chains deeper than
    /// [`MAX_NESTING_DEPTH`].
    fn containing_root(&self, declaring: EntityHandle) -> Option<TypeEntryRc> {
        let mut current = self.registry.type_entry(declaring)?;
        for _ in 0..MAX_NESTING_DEPTH {
            if current.constructed {
                return None;
            }
            match current.declaring_type {
                Some(parent) => current = self.registry.type_entry(parent)?,
                None => return Some(current),
            }
        }
        None
    }

    /// Resolves the declaring type, kind and display name of any entity handle.
    fn entity_info(&self, target: EntityHandle) -> Result<(EntityHandle, MemberKind, String)> {
        if let Some(entry) = self.registry.type_entry(target) {
            return Ok((target, MemberKind::Type, entry.name.clone()));
        }
        if let Some(entry) = self.registry.method_entry(target) {
            return Ok((entry.declaring_type, MemberKind::Method, entry.name.clone()));
        }
        if let Some(entry) = self.registry.field_entry(target) {
            return Ok((entry.declaring_type, MemberKind::Field, entry.name.clone()));
        }
        if let Some(entry) = self.registry.property_entry(target) {
            return Ok((
                entry.declaring_type,
                MemberKind::Property,
                entry.name.clone(),
            ));
        }
        if let Some(entry) = self.registry.event_entry(target) {
            return Ok((entry.declaring_type, MemberKind::Event, entry.name.clone()));
        }
        Err(Error::UnresolvedEntity(target.token))
    }
}

/// Maps a hit to its spans in the rendered root, per query shape.
///
/// A member hit may reference the target from several statements; each one
/// becomes its own span. Falls back to the hit's declaration span when no
/// precise position can be recovered from the tree, so a hit always yields at
/// least one usable result.
fn locate_hit(
    unit: &Decompilation,
    hit: &Hit,
    target: EntityHandle,
    needles: &[EntityHandle],
    shape: QueryShape,
) -> Vec<TextSpan> {
    let tree = &unit.tree;
    let member = hit.handle();

    let mut spans = match shape {
        QueryShape::Member => {
            let mut spans: Vec<TextSpan> = needles
                .iter()
                .flat_map(|&needle| locators::find_in_body(tree, member, needle))
                .collect();
            // Needles overlap on accessor-annotated statements.
            spans.sort_by_key(|s| (s.start, s.end));
            spans.dedup();
            spans
        }
        QueryShape::Type => match hit {
            Hit::Type(_) => locators::find_in_base_list(tree, member, target),
            _ => locators::find_type_anywhere(tree, member, target),
        },
        QueryShape::Declaration => Vec::new(),
    };

    if spans.is_empty() {
        spans.push(locators::find_declaration(tree, member).unwrap_or_else(min_span));
    }
    spans
}

/// Degenerate span at the top of a document.
fn min_span() -> TextSpan {
    TextSpan::new(TextLocation::new(1, 1), TextLocation::new(1, 1))
}
