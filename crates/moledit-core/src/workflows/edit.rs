use crate::core::models::ids::{AtomId, BondId};
use crate::core::models::molecule::{GraphError, MoleculeGraph};
use crate::core::topology::fragment;
use crate::core::utils::geometry::{self, FragmentTransform, GeometryWarning};
use crate::engine::error::EditError;
use crate::engine::session::SessionEntry;
use crate::engine::transaction::Mutation;
use itertools::Itertools;
use nalgebra::Point3;
use tracing::{debug, info, instrument, warn};

/// A geometric quantity read from the current positions.
///
/// Distances are in Angstroms, angles and dihedrals in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Distance(f64),
    Angle(f64),
    Dihedral(f64),
}

impl Measurement {
    pub fn value(&self) -> f64 {
        match *self {
            Self::Distance(v) | Self::Angle(v) | Self::Dihedral(v) => v,
        }
    }
}

/// Details of a geometry edit. Values use the same units as [`Measurement`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditReport {
    /// Atoms whose positions were rewritten, in external-index order.
    pub moved_atoms: Vec<AtomId>,
    pub previous: Option<f64>,
    /// The value measured after the edit.
    pub current: Option<f64>,
    pub warnings: Vec<GeometryWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// Positions changed and one undo step was recorded.
    Applied(EditReport),
    /// Nothing moved: the target was already met, or the geometry was degenerate
    /// (see the report's warnings). No undo step was recorded.
    Unchanged(EditReport),
}

impl EditOutcome {
    pub fn report(&self) -> &EditReport {
        match self {
            Self::Applied(report) | Self::Unchanged(report) => report,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn warnings(&self) -> &[GeometryWarning] {
        &self.report().warnings
    }
}

/// The atoms that move in an edit, and whether the edited bond closes a ring.
struct FragmentPlan {
    atoms: Vec<AtomId>,
    ring: bool,
}

impl FragmentPlan {
    /// Everything reachable from `seed` without crossing `bond`. The edit closes a
    /// ring if `fixed` is reachable that way too.
    fn new(graph: &MoleculeGraph, seed: AtomId, bond: BondId, fixed: AtomId) -> Self {
        let set = fragment::partition(graph, seed, Some(bond));
        let ring = set.contains(&fixed);
        debug!(fragment_size = set.len(), ring, "Partitioned moving fragment");
        Self {
            atoms: fragment::ordered(graph, &set),
            ring,
        }
    }

    fn positions(&self, graph: &MoleculeGraph) -> Result<Vec<Point3<f64>>, EditError> {
        Ok(positions(graph, &self.atoms)?)
    }
}

fn positions(graph: &MoleculeGraph, ids: &[AtomId]) -> Result<Vec<Point3<f64>>, GraphError> {
    ids.iter().map(|&id| graph.position(id)).collect()
}

fn expect_selection<const N: usize>(
    graph: &MoleculeGraph,
    selection: &[AtomId],
    operation: &'static str,
) -> Result<[AtomId; N], EditError> {
    let atoms = <[AtomId; N]>::try_from(selection).map_err(|_| EditError::InvalidSelection {
        operation,
        expected: N,
        actual: selection.len(),
    })?;
    if !atoms.iter().all_unique() {
        return Err(EditError::RepeatedAtom { operation });
    }
    if let Some(&missing) = atoms.iter().find(|&&id| !graph.contains_atom(id)) {
        return Err(GraphError::AtomNotFound(missing).into());
    }
    Ok(atoms)
}

fn require_bond(graph: &MoleculeGraph, first: AtomId, second: AtomId) -> Result<BondId, EditError> {
    graph
        .get_bond(first, second)
        .ok_or(EditError::MissingBond { first, second })
}

fn require_finite(value: f64) -> Result<(), EditError> {
    if !value.is_finite() {
        return Err(EditError::NonFiniteTarget { value });
    }
    Ok(())
}

/// Writes a transform back to the entry as one undoable step and builds the outcome.
fn commit<M>(
    entry: &mut SessionEntry,
    operation: &'static str,
    plan: FragmentPlan,
    transform: FragmentTransform,
    measure_after: M,
    to_public: fn(f64) -> f64,
) -> Result<EditOutcome, EditError>
where
    M: Fn(&MoleculeGraph) -> Option<f64>,
{
    let mut warnings: Vec<GeometryWarning> = transform.warning.into_iter().collect();
    if transform.moved && plan.ring {
        warnings.push(GeometryWarning::RingClosure);
    }
    for warning in &warnings {
        warn!(operation, ?warning, "Degenerate geometry resolved by fallback");
    }

    let previous = transform.previous.map(to_public);
    if !transform.moved {
        debug!(operation, ?previous, "No atoms moved");
        return Ok(EditOutcome::Unchanged(EditReport {
            moved_atoms: Vec::new(),
            previous,
            current: previous,
            warnings,
        }));
    }

    let updates: Vec<(AtomId, Point3<f64>)> = plan
        .atoms
        .iter()
        .copied()
        .zip(transform.positions)
        .collect();
    entry.transaction(|graph| {
        graph.apply_positions(&updates)?;
        Ok(Mutation::Applied(()))
    })?;

    let current = measure_after(entry.graph()).map(to_public);
    info!(
        operation,
        molecule = entry.name(),
        moved = plan.atoms.len(),
        ?previous,
        ?current,
        "Geometry edit applied"
    );
    Ok(EditOutcome::Applied(EditReport {
        moved_atoms: plan.atoms,
        previous,
        current,
        warnings,
    }))
}

/// Sets the length of the bond between `selection[0]` (fixed) and `selection[1]`
/// (moving) to `target` Angstroms, translating everything on the moving side.
#[instrument(skip_all, name = "bond_length_workflow")]
pub fn set_bond_length(
    entry: &mut SessionEntry,
    selection: &[AtomId],
    target: f64,
) -> Result<EditOutcome, EditError> {
    let graph = entry.graph();
    let [fixed, moving] = expect_selection::<2>(graph, selection, "bond length")?;
    require_finite(target)?;
    if target <= 0.0 {
        return Err(EditError::TargetOutOfRange {
            value: target,
            min: 0.0,
            max: f64::INFINITY,
        });
    }
    let bond = require_bond(graph, fixed, moving)?;

    let plan = FragmentPlan::new(graph, moving, bond, fixed);
    let transform = geometry::bond_length(
        &graph.position(fixed)?,
        &graph.position(moving)?,
        &plan.positions(graph)?,
        target,
    );

    let measure = move |g: &MoleculeGraph| {
        Some(geometry::distance(&g.position(fixed).ok()?, &g.position(moving).ok()?))
    };
    commit(entry, "bond length", plan, transform, measure, |v| v)
}

/// Sets the angle `selection[0]-selection[1]-selection[2]` to `target_degrees` by
/// rotating the side of `selection[2]` about the pivot `selection[1]`.
#[instrument(skip_all, name = "angle_workflow")]
pub fn set_angle(
    entry: &mut SessionEntry,
    selection: &[AtomId],
    target_degrees: f64,
) -> Result<EditOutcome, EditError> {
    let graph = entry.graph();
    let [first, pivot, moving] = expect_selection::<3>(graph, selection, "bond angle")?;
    require_finite(target_degrees)?;
    if !(0.0..=180.0).contains(&target_degrees) {
        return Err(EditError::TargetOutOfRange {
            value: target_degrees,
            min: 0.0,
            max: 180.0,
        });
    }
    require_bond(graph, first, pivot)?;
    let bond = require_bond(graph, pivot, moving)?;

    let plan = FragmentPlan::new(graph, moving, bond, pivot);
    let transform = geometry::angle(
        &graph.position(first)?,
        &graph.position(pivot)?,
        &graph.position(moving)?,
        &plan.positions(graph)?,
        target_degrees.to_radians(),
    );

    let measure = move |g: &MoleculeGraph| {
        geometry::measure_angle(
            &g.position(first).ok()?,
            &g.position(pivot).ok()?,
            &g.position(moving).ok()?,
        )
    };
    commit(entry, "bond angle", plan, transform, measure, f64::to_degrees)
}

/// Sets the dihedral `selection[0..4]` to `target_degrees` by rotating the side of
/// `selection[2]` about the `selection[1] → selection[2]` axis.
///
/// Any finite target is accepted and wrapped into (-180, 180].
#[instrument(skip_all, name = "dihedral_workflow")]
pub fn set_dihedral(
    entry: &mut SessionEntry,
    selection: &[AtomId],
    target_degrees: f64,
) -> Result<EditOutcome, EditError> {
    let graph = entry.graph();
    let [a, b, c, d] = expect_selection::<4>(graph, selection, "dihedral")?;
    require_finite(target_degrees)?;
    require_bond(graph, a, b)?;
    let axis_bond = require_bond(graph, b, c)?;
    require_bond(graph, c, d)?;

    let plan = FragmentPlan::new(graph, c, axis_bond, b);
    let transform = geometry::dihedral(
        &graph.position(a)?,
        &graph.position(b)?,
        &graph.position(c)?,
        &graph.position(d)?,
        &plan.positions(graph)?,
        geometry::wrap_angle(target_degrees.to_radians()),
    );

    let measure = move |g: &MoleculeGraph| {
        geometry::measure_dihedral(
            &g.position(a).ok()?,
            &g.position(b).ok()?,
            &g.position(c).ok()?,
            &g.position(d).ok()?,
        )
    };
    commit(entry, "dihedral", plan, transform, measure, f64::to_degrees)
}

/// Measures a distance (2 atoms), angle (3 atoms) or dihedral (4 atoms).
pub fn measure(graph: &MoleculeGraph, selection: &[AtomId]) -> Result<Measurement, EditError> {
    const OPERATION: &str = "measurement";
    match selection.len() {
        2 => {
            let [a, b] = expect_selection::<2>(graph, selection, OPERATION)?;
            Ok(Measurement::Distance(geometry::distance(
                &graph.position(a)?,
                &graph.position(b)?,
            )))
        }
        3 => {
            let [a, b, c] = expect_selection::<3>(graph, selection, OPERATION)?;
            geometry::measure_angle(&graph.position(a)?, &graph.position(b)?, &graph.position(c)?)
                .map(|rad| Measurement::Angle(rad.to_degrees()))
                .ok_or(EditError::UndefinedMeasurement)
        }
        4 => {
            let [a, b, c, d] = expect_selection::<4>(graph, selection, OPERATION)?;
            geometry::measure_dihedral(
                &graph.position(a)?,
                &graph.position(b)?,
                &graph.position(c)?,
                &graph.position(d)?,
            )
            .map(|rad| Measurement::Dihedral(rad.to_degrees()))
            .ok_or(EditError::UndefinedMeasurement)
        }
        actual => Err(EditError::InvalidSelection {
            operation: OPERATION,
            expected: actual.clamp(2, 4),
            actual,
        }),
    }
}
