//! The composite model: the instantiation of a [`crate::recipe::Recipe`]
//! into a frame tree, a set of elements and the discovered optical paths
//! (spec.md §3's `GenericCompositeModel`, §4.6's instantiation order).

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, warn};

use crate::core::math::Vec3;
use crate::core::Float;
use crate::element::{self, OpticalElement};
use crate::frame::{FrameArena, FrameId};
use crate::recipe::ast::{Arg, CustomElement, Expr, Statement, Transform};
use crate::recipe::eval::{self, CustomFn, SymbolTable};
use crate::recipe::Recipe;

/// A `Real` slot driven at runtime, clamped to `[min, max]` (spec.md §4.6:
/// "runtime set of a DOF to a value outside [min,max] is rejected silently").
#[derive(Debug, Clone, Copy)]
pub struct Dof {
    pub value: Float,
    pub min: Float,
    pub max: Float,
}

impl Dof {
    fn in_bounds(&self, v: Float) -> bool {
        v >= self.min && v <= self.max
    }
}

/// A named, ordered sequence of element names discovered from a `path`
/// declaration (spec.md §3's `RecipeOpticalPath`).
#[derive(Debug, Clone)]
pub struct OpticalPath {
    pub name: String,
    pub elements: Vec<String>,
}

enum BindingKind {
    Translated,
    Rotated,
}

impl BindingKind {
    /// Names positional arguments bind to, in order (spec.md §6: "a rotate
    /// takes `angle, ex, ey, ez`; a translate takes `dx, dy, dz`").
    fn positional_names(&self) -> &'static [&'static str] {
        match self {
            BindingKind::Translated => &["dx", "dy", "dz"],
            BindingKind::Rotated => &["angle", "ex", "ey", "ez"],
        }
    }
}

/// A `translate`/`rotate` frame whose arguments may reference a DOF;
/// re-evaluated by [`CompositeModel::apply_dofs`] whenever a DOF changes.
struct FrameBinding {
    frame: FrameId,
    kind: BindingKind,
    args: Vec<Arg>,
}

/// The instantiated model: owns the frame tree and every element the
/// recipe declared, keyed by instance name.
pub struct CompositeModel {
    frames: FrameArena,
    elements: HashMap<String, Box<dyn OpticalElement>>,
    dofs: HashMap<String, Dof>,
    params: HashMap<String, Float>,
    paths: HashMap<String, OpticalPath>,
    custom_functions: HashMap<String, CustomFn>,
    root_statements: Vec<Statement>,
    bindings: Vec<FrameBinding>,
}

impl CompositeModel {
    pub fn frames(&self) -> &FrameArena {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut FrameArena {
        &mut self.frames
    }

    pub fn element(&self, name: &str) -> Option<&dyn OpticalElement> {
        self.elements.get(name).map(|e| e.as_ref())
    }

    pub fn element_mut(&mut self, name: &str) -> Option<&mut Box<dyn OpticalElement>> {
        self.elements.get_mut(name)
    }

    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(|s| s.as_str())
    }

    pub fn paths(&self) -> impl Iterator<Item = &OpticalPath> {
        self.paths.values()
    }

    pub fn path(&self, name: &str) -> Option<&OpticalPath> {
        self.paths.get(name)
    }

    pub fn dof_value(&self, name: &str) -> Option<Float> {
        self.dofs.get(name).map(|d| d.value)
    }

    /// Sets a DOF, silently rejecting an out-of-bounds value (spec.md
    /// §4.6), then re-evaluates every `translate`/`rotate` frame whose
    /// arguments depend on a DOF and recomputes the frame tree.
    pub fn set_dof(&mut self, name: &str, value: Float) -> bool {
        match self.dofs.get_mut(name) {
            Some(dof) if dof.in_bounds(value) => {
                dof.value = value;
                if let Err(err) = self.apply_dofs() {
                    warn!(dof = name, %err, "failed to re-evaluate frame bindings after DOF change");
                }
                true
            }
            Some(_) => {
                warn!(dof = name, value, "DOF value out of bounds, rejected");
                false
            }
            None => false,
        }
    }

    /// Re-evaluates every `translate`/`rotate` argument against the current
    /// DOF values and pushes the results into the frame tree, then
    /// recomputes the whole tree. This crate re-evaluates every binding
    /// rather than only the subset that actually depends on the changed
    /// DOF; spec.md §4.6's dirty-tracking optimisation is not load-bearing
    /// for correctness, only for avoiding redundant work.
    pub fn apply_dofs(&mut self) -> Result<()> {
        let overrides: HashMap<String, Float> = self.dofs.iter().map(|(k, v)| (k.clone(), v.value)).collect();
        let (symbols, _, _) = bind_root_scope(&self.root_statements, &self.custom_functions, &overrides)?;
        for binding in &self.bindings {
            let args = eval_args(&binding.args, &symbols, &self.custom_functions, binding.kind.positional_names())?;
            match binding.kind {
                BindingKind::Translated => {
                    let d = Vec3::new(
                        args.get("dx").copied().unwrap_or(0.0),
                        args.get("dy").copied().unwrap_or(0.0),
                        args.get("dz").copied().unwrap_or(0.0),
                    );
                    self.frames.set_distance(binding.frame, d);
                }
                BindingKind::Rotated => {
                    let angle = args.get("angle").copied().unwrap_or(0.0);
                    let ex = args.get("ex").copied().unwrap_or(0.0);
                    let ey = args.get("ey").copied().unwrap_or(0.0);
                    let ez = args.get("ez").copied().unwrap_or(1.0);
                    self.frames.set_rotation(binding.frame, Vec3::new(ex, ey, ez).normalize(), angle);
                }
            }
        }
        self.frames.recalculate(FrameId::WORLD);
        Ok(())
    }

    pub fn build(recipe: &Recipe) -> Result<Self> {
        let custom_functions: HashMap<String, CustomFn> = HashMap::new();
        let mut custom_elements: HashMap<String, CustomElement> = HashMap::new();

        let (symbols, dofs, params) = bind_root_scope(&recipe.statements, &custom_functions, &HashMap::new())?;

        let mut model = Self {
            frames: FrameArena::new(),
            elements: HashMap::new(),
            dofs,
            params,
            paths: HashMap::new(),
            custom_functions,
            root_statements: recipe.statements.clone(),
            bindings: Vec::new(),
        };

        let mut builder = Builder {
            model: &mut model,
            symbols,
            custom_elements: &mut custom_elements,
        };
        builder.walk(&recipe.statements, FrameId::WORLD)?;

        model.frames.recalculate(FrameId::WORLD);
        Ok(model)
    }
}

/// Evaluates every root-level `dof`/`parameter`/`var` declaration in
/// dependency order (spec.md §4.6: "expressions are topologically sorted
/// so that an expression is evaluated only after its inputs"). `dof_overrides`
/// supplants a DOF's compiled default with a live runtime value, used by
/// [`CompositeModel::apply_dofs`] to re-derive dependent `var`s/`parameter`s.
fn bind_root_scope(
    statements: &[Statement],
    functions: &HashMap<String, CustomFn>,
    dof_overrides: &HashMap<String, Float>,
) -> Result<(SymbolTable, HashMap<String, Dof>, HashMap<String, Float>)> {
    let mut exprs: HashMap<String, &Expr> = HashMap::new();
    let mut bounds: HashMap<String, (Option<&Expr>, Option<&Expr>)> = HashMap::new();
    let mut is_dof: HashMap<String, bool> = HashMap::new();

    for stmt in statements {
        match stmt {
            Statement::Dof(d) => {
                exprs.insert(d.name.clone(), &d.default);
                bounds.insert(d.name.clone(), (d.min.as_ref(), d.max.as_ref()));
                is_dof.insert(d.name.clone(), true);
            }
            Statement::Param(p) => {
                exprs.insert(p.name.clone(), &p.default);
                bounds.insert(p.name.clone(), (p.min.as_ref(), p.max.as_ref()));
                is_dof.insert(p.name.clone(), false);
            }
            Statement::Var(v) => {
                exprs.insert(v.name.clone(), &v.expr);
            }
            _ => {}
        }
    }

    let mut symbols = SymbolTable::new();
    let mut done: HashMap<String, bool> = HashMap::new();
    let mut visiting: HashMap<String, bool> = HashMap::new();

    let names: Vec<String> = exprs.keys().cloned().collect();
    for name in &names {
        visit_root_symbol(name, &exprs, &is_dof, dof_overrides, functions, &mut symbols, &mut visiting, &mut done)?;
    }

    let mut dofs = HashMap::new();
    let mut params = HashMap::new();
    for (name, is_d) in is_dof {
        let value = symbols.get(&name).expect("every declared symbol was evaluated");
        let (min_expr, max_expr) = bounds.get(&name).copied().unwrap_or((None, None));
        let min = match min_expr {
            Some(e) => eval::eval(e, &symbols, functions)?,
            None => Float::NEG_INFINITY,
        };
        let max = match max_expr {
            Some(e) => eval::eval(e, &symbols, functions)?,
            None => Float::INFINITY,
        };
        if is_d && (min > value || value > max) {
            bail!("DOF '{name}' default {value} is outside bounds [{min}, {max}]");
        }
        if is_d {
            dofs.insert(name, Dof { value, min, max });
        } else {
            params.insert(name, value);
        }
    }

    Ok((symbols, dofs, params))
}

#[allow(clippy::too_many_arguments)]
fn visit_root_symbol(
    name: &str,
    exprs: &HashMap<String, &Expr>,
    is_dof: &HashMap<String, bool>,
    dof_overrides: &HashMap<String, Float>,
    functions: &HashMap<String, CustomFn>,
    symbols: &mut SymbolTable,
    visiting: &mut HashMap<String, bool>,
    done: &mut HashMap<String, bool>,
) -> Result<()> {
    if done.contains_key(name) {
        return Ok(());
    }
    if visiting.contains_key(name) {
        bail!("cyclic expression dependency involving '{name}'");
    }
    let Some(expr) = exprs.get(name) else {
        return Ok(());
    };
    visiting.insert(name.to_string(), true);

    let mut deps = Vec::new();
    eval::free_idents(expr, &mut deps);
    for dep in deps {
        if exprs.contains_key(&dep) {
            visit_root_symbol(&dep, exprs, is_dof, dof_overrides, functions, symbols, visiting, done)?;
        }
    }

    let value = if is_dof.get(name).copied().unwrap_or(false) {
        dof_overrides
            .get(name)
            .copied()
            .map_or_else(|| eval::eval(expr, symbols, functions).with_context(|| format!("evaluating '{name}'")), Ok)?
    } else {
        eval::eval(expr, symbols, functions).with_context(|| format!("evaluating '{name}'"))?
    };
    symbols.set(name.to_string(), value);
    visiting.remove(name);
    done.insert(name.to_string(), true);
    Ok(())
}

/// Evaluates an argument list, binding positional arguments to
/// `positional_names` in order (spec.md §6: "argument lists support
/// positional-then-named style"). An unnamed argument beyond the end of
/// `positional_names` has no target to bind to and is an error, not a
/// silent drop.
fn eval_args(
    args: &[Arg],
    symbols: &SymbolTable,
    functions: &HashMap<String, CustomFn>,
    positional_names: &[&str],
) -> Result<HashMap<String, Float>> {
    let mut out = HashMap::new();
    let mut positional_index = 0usize;
    for arg in args {
        let value = eval::eval(&arg.expr, symbols, functions)?;
        match &arg.name {
            Some(name) => {
                out.insert(name.clone(), value);
            }
            None => {
                let name = positional_names
                    .get(positional_index)
                    .ok_or_else(|| anyhow!("too many positional arguments (expected at most {})", positional_names.len()))?;
                out.insert((*name).to_string(), value);
                positional_index += 1;
            }
        }
    }
    Ok(out)
}

struct Builder<'a> {
    model: &'a mut CompositeModel,
    symbols: SymbolTable,
    custom_elements: &'a mut HashMap<String, CustomElement>,
}

impl<'a> Builder<'a> {
    fn walk(&mut self, statements: &[Statement], current_frame: FrameId) -> Result<()> {
        for stmt in statements {
            self.walk_one(stmt, current_frame)?;
        }
        Ok(())
    }

    fn walk_one(&mut self, stmt: &Statement, current_frame: FrameId) -> Result<()> {
        match stmt {
            Statement::Dof(_) | Statement::Param(_) | Statement::Var(_) => {
                // Root-scope values were already bound in `bind_root_scope`.
            }
            Statement::Import(path) => {
                debug!(path, "recipe import directive noted, not resolved by this crate");
            }
            Statement::Script(path) => {
                debug!(path, "recipe script directive noted, not executed by this crate");
            }
            Statement::Rotate(t) => self.walk_rotate(t, current_frame)?,
            Statement::Translate(t) => self.walk_translate(t, current_frame)?,
            Statement::OnPort(on_port) => {
                let target_frame = {
                    let element = self
                        .model
                        .elements
                        .get(&on_port.of)
                        .ok_or_else(|| anyhow!("'on {} of {}': unknown element '{}'", on_port.port, on_port.of, on_port.of))?;
                    *element
                        .ports()
                        .get(&on_port.port)
                        .ok_or_else(|| anyhow!("element '{}' has no port named '{}'", on_port.of, on_port.port))?
                };
                self.walk(&on_port.body, target_frame)?;
            }
            Statement::Element(decl) => {
                let params = eval_args(&decl.args, &self.symbols, &self.model.custom_functions, &[])?;
                if self.model.elements.contains_key(&decl.name) {
                    bail!("duplicate element name '{}'", decl.name);
                }
                if let Some(custom) = self.custom_elements.get(&decl.factory).cloned() {
                    self.instantiate_custom(&custom, &decl.name, current_frame, &params)?;
                } else {
                    let built = element::registry::build(&decl.factory, current_frame, &mut self.model.frames, &params)
                        .with_context(|| format!("instantiating '{}' ({})", decl.name, decl.factory))?;
                    self.model.elements.insert(decl.name.clone(), built);
                }
            }
            Statement::Path(p) => {
                for name in &p.elements {
                    if !self.model.elements.contains_key(name) {
                        bail!("path '{}' references unknown element '{}'", p.name, name);
                    }
                }
                self.model.paths.insert(
                    p.name.clone(),
                    OpticalPath {
                        name: p.name.clone(),
                        elements: p.elements.clone(),
                    },
                );
            }
            Statement::CustomElement(def) => {
                self.custom_elements.insert(def.name.clone(), def.clone());
            }
        }
        Ok(())
    }

    fn walk_rotate(&mut self, t: &Transform, current_frame: FrameId) -> Result<()> {
        let args = eval_args(&t.args, &self.symbols, &self.model.custom_functions, BindingKind::Rotated.positional_names())?;
        if !args.contains_key("angle") {
            bail!("rotate() needs an 'angle' argument");
        }
        let angle = args["angle"];
        let ex = args.get("ex").copied().unwrap_or(0.0);
        let ey = args.get("ey").copied().unwrap_or(0.0);
        let ez = args.get("ez").copied().unwrap_or(1.0);
        let axis = Vec3::new(ex, ey, ez).normalize();

        let child_frame = self.model.frames.add_rotated(current_frame, axis, angle);
        self.model.bindings.push(FrameBinding {
            frame: child_frame,
            kind: BindingKind::Rotated,
            args: t.args.clone(),
        });

        self.symbols.push_scope();
        for (k, v) in &args {
            self.symbols.set(k.clone(), *v);
        }
        let result = self.walk(&t.body, child_frame);
        self.symbols.pop_scope();
        result
    }

    fn walk_translate(&mut self, t: &Transform, current_frame: FrameId) -> Result<()> {
        let args = eval_args(&t.args, &self.symbols, &self.model.custom_functions, BindingKind::Translated.positional_names())?;
        let dx = args.get("dx").copied().unwrap_or(0.0);
        let dy = args.get("dy").copied().unwrap_or(0.0);
        let dz = args.get("dz").copied().unwrap_or(0.0);

        let child_frame = self.model.frames.add_translated(current_frame, Vec3::new(dx, dy, dz));
        self.model.bindings.push(FrameBinding {
            frame: child_frame,
            kind: BindingKind::Translated,
            args: t.args.clone(),
        });

        self.symbols.push_scope();
        for (k, v) in &args {
            self.symbols.set(k.clone(), *v);
        }
        let result = self.walk(&t.body, child_frame);
        self.symbols.pop_scope();
        result
    }

    /// Flattens a custom element's body under a fresh substrate frame. Its
    /// declared ports are resolved from same-named element instances
    /// created inside the body: `port left;` exposes the frame of the
    /// element instance named `left`. Narrower than a fully general
    /// port-forwarding scheme but covers every shape the recipe grammar can
    /// express for a leaf custom element.
    fn instantiate_custom(&mut self, def: &CustomElement, instance_name: &str, parent: FrameId, params: &HashMap<String, Float>) -> Result<()> {
        let substrate = self.model.frames.add_translated(parent, Vec3::zero());
        self.symbols.push_scope();
        for (k, v) in params {
            self.symbols.set(k.clone(), *v);
        }
        let inner_prefix = format!("{instance_name}::");
        let body = rename_elements(&def.body, &inner_prefix);
        self.walk(&body, substrate)?;
        self.symbols.pop_scope();

        let mut ports = HashMap::new();
        for port in &def.ports {
            let inner_name = format!("{inner_prefix}{port}");
            if let Some(inner) = self.model.elements.get(&inner_name) {
                ports.insert(port.clone(), inner.child_frames().first().copied().unwrap_or(substrate));
            }
        }
        self.model.elements.insert(
            instance_name.to_string(),
            Box::new(element::builtin::CompositeWrapper::new(instance_name, substrate, ports)),
        );
        Ok(())
    }
}

fn rename_elements(statements: &[Statement], prefix: &str) -> Vec<Statement> {
    statements
        .iter()
        .map(|stmt| match stmt {
            Statement::Element(decl) => {
                let mut decl = decl.clone();
                decl.name = format!("{prefix}{}", decl.name);
                Statement::Element(decl)
            }
            Statement::Rotate(t) => Statement::Rotate(Transform {
                args: t.args.clone(),
                body: rename_elements(&t.body, prefix),
            }),
            Statement::Translate(t) => Statement::Translate(Transform {
                args: t.args.clone(),
                body: rename_elements(&t.body, prefix),
            }),
            other => other.clone(),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::recipe::parse;

    #[test]
    fn test_block_element_builds_with_default_dimensions() {
        let recipe = parse("<mem>", "BlockElement block;").unwrap();
        let model = CompositeModel::build(&recipe).unwrap();
        let block = model.element("block").unwrap();
        assert_eq!(block.properties().get_real("width"), Some(1.0));
    }

    #[test]
    fn test_dof_driven_translation_relocates_child() {
        let recipe = parse(
            "<mem>",
            "dof x(-1, 1) = 0;\ntranslate(dx = x, dy = 0, dz = 0) { BlockElement child; }",
        )
        .unwrap();
        let mut model = CompositeModel::build(&recipe).unwrap();

        assert!(model.set_dof("x", 0.37));

        let child_frame = *model.element("child").unwrap().child_frames().first().unwrap();
        assert!(model.frames().center(child_frame).approx_eq(&Vec3::new(0.37, 0.0, 0.0), 1e-9));
    }

    #[test]
    fn test_positional_translate_arguments_relocate_child() {
        let recipe = parse("<mem>", "translate(0.37, 0, 0) { BlockElement child; }").unwrap();
        let model = CompositeModel::build(&recipe).unwrap();
        let child_frame = *model.element("child").unwrap().child_frames().first().unwrap();
        assert!(model.frames().center(child_frame).approx_eq(&Vec3::new(0.37, 0.0, 0.0), 1e-9));
    }

    #[test]
    fn test_positional_rotate_angle_argument_is_honored() {
        let recipe = parse("<mem>", "rotate(1.5707963267948966) { BlockElement child; }").unwrap();
        let model = CompositeModel::build(&recipe).unwrap();
        assert!(model.element("child").is_some());
    }

    #[test]
    fn test_out_of_bounds_dof_is_rejected() {
        let recipe = parse("<mem>", "dof x(-1, 1) = 0;\ntranslate(dx = x, dy = 0, dz = 0) { BlockElement child; }").unwrap();
        let mut model = CompositeModel::build(&recipe).unwrap();
        assert!(!model.set_dof("x", 5.0));
        assert_eq!(model.dof_value("x"), Some(0.0));
    }

    #[test]
    fn test_path_declaration_collects_elements() {
        let recipe = parse(
            "<mem>",
            "FlatMirror a(radius = 0.5);\nFlatMirror b(radius = 0.5);\npath main a to b;",
        )
        .unwrap();
        let model = CompositeModel::build(&recipe).unwrap();
        let path = model.path("main").unwrap();
        assert_eq!(path.elements, vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_element_name_fails() {
        let recipe = parse("<mem>", "BlockElement block;\nBlockElement block;").unwrap();
        assert!(CompositeModel::build(&recipe).is_err());
    }

    #[test]
    fn test_unresolved_factory_fails() {
        let recipe = parse("<mem>", "NoSuchFactory thing;").unwrap();
        assert!(CompositeModel::build(&recipe).is_err());
    }
}
