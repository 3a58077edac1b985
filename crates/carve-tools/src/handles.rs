//! Position-keyed handle managers for vertex, edge, and face editing.
//!
//! Handles are addressed purely by position: coincident handles contributed
//! by different brushes coalesce into one entry that remembers every owner,
//! so dragging a shared corner moves all the brushes that meet there.

use carve_kernel_brush::Brush;
use carve_kernel_math::{Point3, Ray, Tolerance};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable key of a brush in the editable set.
    pub struct BrushId;
}

/// The editable set of brushes the tools operate on.
pub type BrushMap = SlotMap<BrushId, Brush>;

/// One coalesced handle: a position plus every brush contributing it.
#[derive(Debug, Clone)]
pub struct HandleEntry {
    /// The handle position.
    pub position: Point3,
    /// Brushes contributing a handle at this position, in insertion order.
    pub owners: Vec<BrushId>,
    /// Whether the handle is in the selected partition.
    pub selected: bool,
}

impl HandleEntry {
    /// How many brushes contribute this handle.
    pub fn count(&self) -> usize {
        self.owners.len()
    }
}

/// Which element of a brush a manager tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    /// Vertex positions.
    Vertex,
    /// Edge midpoints.
    Edge,
    /// Face centroids.
    Face,
}

/// A manager for one kind of handle, partitioned into selected and
/// unselected.
#[derive(Debug, Clone)]
pub struct HandleManager {
    kind: HandleKind,
    entries: Vec<HandleEntry>,
    tol: Tolerance,
}

impl HandleManager {
    /// An empty manager for one handle kind.
    pub fn new(kind: HandleKind, tol: Tolerance) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            tol,
        }
    }

    /// The kind of handle this manager tracks.
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    fn entry_index(&self, position: &Point3) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| self.tol.points_equal(&e.position, position))
    }

    /// Register one handle for `owner`, coalescing with an existing entry
    /// at the same position.
    pub fn add_handle(&mut self, position: &Point3, owner: BrushId) {
        match self.entry_index(position) {
            Some(i) => {
                if !self.entries[i].owners.contains(&owner) {
                    self.entries[i].owners.push(owner);
                }
            }
            None => self.entries.push(HandleEntry {
                position: *position,
                owners: vec![owner],
                selected: false,
            }),
        }
    }

    /// Register every handle a brush contributes.
    pub fn add_handles(&mut self, brush: &Brush, owner: BrushId) {
        let positions = match self.kind {
            HandleKind::Vertex => brush.polyhedron().vertex_positions(),
            HandleKind::Edge => brush.polyhedron().edge_centers(),
            HandleKind::Face => brush.polyhedron().face_centroids(),
        };
        for p in positions {
            self.add_handle(&p, owner);
        }
    }

    /// Remove `owner` from the entry at `position`, dropping the entry when
    /// it has no owners left.
    pub fn remove_handle(&mut self, position: &Point3, owner: BrushId) {
        if let Some(i) = self.entry_index(position) {
            self.entries[i].owners.retain(|&o| o != owner);
            if self.entries[i].owners.is_empty() {
                self.entries.remove(i);
            }
        }
    }

    /// Remove every handle a brush contributes.
    pub fn remove_handles(&mut self, brush: &Brush, owner: BrushId) {
        let positions = match self.kind {
            HandleKind::Vertex => brush.polyhedron().vertex_positions(),
            HandleKind::Edge => brush.polyhedron().edge_centers(),
            HandleKind::Face => brush.polyhedron().face_centroids(),
        };
        for p in positions {
            self.remove_handle(&p, owner);
        }
    }

    /// Drop every entry, keeping the kind and tolerance.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Rebuild from the full brush set, keeping the selection of positions
    /// that still exist.
    pub fn rebuild(&mut self, brushes: &BrushMap) {
        let selected: Vec<Point3> = self.selected_handles();
        self.entries.clear();
        for (id, brush) in brushes {
            self.add_handles(brush, id);
        }
        for p in selected {
            self.select(&p);
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select the handle at `position`. Returns false when there is none.
    pub fn select(&mut self, position: &Point3) -> bool {
        match self.entry_index(position) {
            Some(i) => {
                self.entries[i].selected = true;
                true
            }
            None => false,
        }
    }

    /// Deselect the handle at `position`.
    pub fn deselect(&mut self, position: &Point3) -> bool {
        match self.entry_index(position) {
            Some(i) => {
                self.entries[i].selected = false;
                true
            }
            None => false,
        }
    }

    /// Flip the selection of the handle at `position`.
    pub fn toggle(&mut self, position: &Point3) -> bool {
        match self.entry_index(position) {
            Some(i) => {
                self.entries[i].selected = !self.entries[i].selected;
                true
            }
            None => false,
        }
    }

    /// Move every handle to the unselected partition.
    pub fn deselect_all(&mut self) {
        for e in &mut self.entries {
            e.selected = false;
        }
    }

    /// Whether any handle is selected.
    pub fn any_selected(&self) -> bool {
        self.entries.iter().any(|e| e.selected)
    }

    /// Whether the handle at `position` exists.
    pub fn contains(&self, position: &Point3) -> bool {
        self.entry_index(position).is_some()
    }

    /// Whether the handle at `position` is selected.
    pub fn selected(&self, position: &Point3) -> bool {
        self.entry_index(position)
            .map_or(false, |i| self.entries[i].selected)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The entry at `position`.
    pub fn handle_at(&self, position: &Point3) -> Option<&HandleEntry> {
        self.entry_index(position).map(|i| &self.entries[i])
    }

    /// All handle positions.
    pub fn all_handles(&self) -> Vec<Point3> {
        self.entries.iter().map(|e| e.position).collect()
    }

    /// Positions of the selected partition.
    pub fn selected_handles(&self) -> Vec<Point3> {
        self.entries
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.position)
            .collect()
    }

    /// Positions of the unselected partition.
    pub fn unselected_handles(&self) -> Vec<Point3> {
        self.entries
            .iter()
            .filter(|e| !e.selected)
            .map(|e| e.position)
            .collect()
    }

    /// Brushes contributing the handle at `position`.
    pub fn find_incident_brushes(&self, position: &Point3) -> Vec<BrushId> {
        self.handle_at(position)
            .map(|e| e.owners.clone())
            .unwrap_or_default()
    }

    /// The handle nearest to `ray` within `pick_radius` of it, preferring
    /// the one closest to the ray origin.
    pub fn pick(&self, ray: &Ray, pick_radius: f64) -> Option<Point3> {
        let mut best: Option<(f64, Point3)> = None;
        for e in &self.entries {
            let t = (e.position - ray.origin).dot(ray.direction.as_ref());
            if t < 0.0 {
                continue;
            }
            let dist = (e.position - ray.at(t)).norm();
            if dist > pick_radius {
                continue;
            }
            if best.map_or(true, |(bt, _)| t < bt) {
                best = Some((t, e.position));
            }
        }
        best.map(|(_, p)| p)
    }
}
