use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::domain::entities::organisation::{NewEdge, OrgEdit, OrganisationRecord, Visibility};
use crate::domain::entities::photo::{PhotoPayload, PhotoReplacement};
use crate::domain::entities::record::{columns, field, person_id, Row};
use crate::domain::entities::snapshot::Snapshot;
use crate::errors::{StagingError, StagingResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPersonEntry {
    pub person: Row,
    pub staff: Vec<Row>,
    pub photo: Option<PhotoPayload>,
}

impl NewPersonEntry {
    pub fn id(&self) -> &str {
        person_id(&self.person)
    }
}

/// A staged edit to an existing person. `person` holds only the fields the
/// editor controls; `staff` is the person's complete new affiliation set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEntry {
    pub person: Row,
    pub staff: Vec<Row>,
}

impl EditEntry {
    pub fn id(&self) -> &str {
        person_id(&self.person)
    }
}

/// Pending person/staff changes. A person ID is live in at most one of the
/// new-person list and the edit map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonLedger {
    new_persons: Vec<NewPersonEntry>,
    edits: IndexMap<String, EditEntry>,
    photo_replacements: IndexMap<String, PhotoReplacement>,
}

impl PersonLedger {
    /// Rebuilds a ledger from persisted parts without re-running staging
    /// validation.
    pub fn from_parts(
        new_persons: Vec<NewPersonEntry>,
        edits: IndexMap<String, EditEntry>,
        photo_replacements: IndexMap<String, PhotoReplacement>,
    ) -> Self {
        Self {
            new_persons,
            edits,
            photo_replacements,
        }
    }

    pub fn new_persons(&self) -> &[NewPersonEntry] {
        &self.new_persons
    }

    pub fn edits(&self) -> &IndexMap<String, EditEntry> {
        &self.edits
    }

    pub fn photo_replacements(&self) -> &IndexMap<String, PhotoReplacement> {
        &self.photo_replacements
    }

    pub fn new_person_photos(&self) -> impl Iterator<Item = &PhotoPayload> {
        self.new_persons.iter().filter_map(|entry| entry.photo.as_ref())
    }

    pub fn has_photo_changes(&self) -> bool {
        !self.photo_replacements.is_empty() || self.new_person_photos().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.new_persons.is_empty() && self.edits.is_empty() && self.photo_replacements.is_empty()
    }

    /// Appends a new person, or overwrites the entry at `slot` when one is
    /// given (re-staging a person that is already pending).
    pub fn stage_new_person(
        &mut self,
        snapshot: &Snapshot,
        mut entry: NewPersonEntry,
        slot: Option<usize>,
    ) -> StagingResult<usize> {
        let id = require_person_fields(&entry.person)?;
        if !is_slug(&id) {
            return Err(StagingError::Validation(format!(
                "PersonID `{id}` may only contain lowercase letters, digits and hyphens"
            )));
        }
        if entry.staff.is_empty() {
            return Err(StagingError::Validation(
                "a new person needs at least one affiliation".to_string(),
            ));
        }
        if let Some(slot) = slot {
            if slot >= self.new_persons.len() {
                return Err(StagingError::NotFound(format!("staged new person #{slot}")));
            }
        }
        if snapshot.find_person(&id).is_some() {
            return Err(StagingError::Duplicate(format!(
                "PersonID `{id}` already exists in the masterlist"
            )));
        }
        if self.edits.contains_key(&id) {
            return Err(StagingError::Duplicate(format!(
                "PersonID `{id}` is already staged as an edit"
            )));
        }
        let clashes = self
            .new_persons
            .iter()
            .enumerate()
            .any(|(idx, staged)| Some(idx) != slot && staged.id() == id);
        if clashes {
            return Err(StagingError::Duplicate(format!(
                "PersonID `{id}` is already staged as a new person"
            )));
        }
        entry.staff = attach_staff(&id, entry.staff)?;

        let index = match slot {
            Some(slot) => {
                self.new_persons[slot] = entry;
                slot
            }
            None => {
                self.new_persons.push(entry);
                self.new_persons.len() - 1
            }
        };
        tracing::debug!(person_id = %id, index, "staged new person");
        Ok(index)
    }

    /// Inserts or overwrites the edit for the entry's PersonID. When the
    /// entry was previously staged under `staged_key` and the ID has since
    /// changed, the old key's edit and photo are dropped first. An empty
    /// affiliation set is accepted: it clears the person's affiliations.
    pub fn stage_edited_person(
        &mut self,
        staged_key: Option<&str>,
        mut entry: EditEntry,
        photo: Option<PhotoReplacement>,
    ) -> StagingResult<()> {
        let id = require_person_fields(&entry.person)?;
        if self.new_persons.iter().any(|staged| staged.id() == id) {
            return Err(StagingError::Duplicate(format!(
                "PersonID `{id}` is already staged as a new person"
            )));
        }
        let renamed_from = staged_key.filter(|old_key| *old_key != id);
        if renamed_from.is_some() && self.edits.contains_key(&id) {
            return Err(StagingError::Duplicate(format!(
                "PersonID `{id}` already has a staged edit"
            )));
        }
        entry.staff = attach_staff(&id, entry.staff)?;

        if let Some(old_key) = renamed_from {
            self.edits.shift_remove(old_key);
            self.photo_replacements.shift_remove(old_key);
        }
        self.edits.insert(id.clone(), entry);
        if let Some(photo) = photo {
            self.photo_replacements.insert(id.clone(), photo);
        }
        tracing::debug!(person_id = %id, "staged person edit");
        Ok(())
    }

    pub fn unstage_new_person(&mut self, index: usize) -> Option<NewPersonEntry> {
        (index < self.new_persons.len()).then(|| self.new_persons.remove(index))
    }

    /// Removes the edit and any photo replacement staged with it.
    pub fn unstage_edit(&mut self, id: &str) -> Option<EditEntry> {
        self.photo_replacements.shift_remove(id);
        self.edits.shift_remove(id)
    }

    pub fn clear(&mut self) {
        self.new_persons.clear();
        self.edits.clear();
        self.photo_replacements.clear();
    }
}

/// Pending organisation and hierarchy changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgLedger {
    new_edges: Vec<NewEdge>,
    deleted_edges: BTreeSet<usize>,
    org_edits: IndexMap<String, OrgEdit>,
}

impl OrgLedger {
    pub fn from_parts(
        new_edges: Vec<NewEdge>,
        deleted_edges: BTreeSet<usize>,
        org_edits: IndexMap<String, OrgEdit>,
    ) -> Self {
        Self {
            new_edges,
            deleted_edges,
            org_edits,
        }
    }

    pub fn new_edges(&self) -> &[NewEdge] {
        &self.new_edges
    }

    pub fn deleted_edges(&self) -> &BTreeSet<usize> {
        &self.deleted_edges
    }

    pub fn org_edits(&self) -> &IndexMap<String, OrgEdit> {
        &self.org_edits
    }

    pub fn is_empty(&self) -> bool {
        self.new_edges.is_empty() && self.deleted_edges.is_empty() && self.org_edits.is_empty()
    }

    pub fn is_edge_deleted(&self, original_index: usize) -> bool {
        self.deleted_edges.contains(&original_index)
    }

    /// The organisation as it will be exported: the loaded record with any
    /// staged name/visibility edit applied.
    pub fn effective_org(&self, snapshot: &Snapshot, id: &str) -> Option<OrganisationRecord> {
        let mut record = snapshot.directory().get(id)?.clone();
        if let Some(edit) = self.org_edits.get(id) {
            record.name = edit.name.clone();
            record.visibility = edit.visibility;
        }
        Some(record)
    }

    pub fn stage_hierarchy_add(
        &mut self,
        snapshot: &Snapshot,
        parent: &str,
        child: &str,
        include_restricted: bool,
    ) -> StagingResult<()> {
        let (parent, child) = (parent.trim(), child.trim());
        if parent.is_empty() || child.is_empty() {
            return Err(StagingError::Validation(
                "both parent and child organisation are required".to_string(),
            ));
        }
        if parent == child {
            return Err(StagingError::Validation(
                "parent and child cannot be the same organisation".to_string(),
            ));
        }

        let parent_org = self
            .effective_org(snapshot, parent)
            .ok_or_else(|| StagingError::NotFound(format!("parent organisation `{parent}`")))?;
        let child_org = self
            .effective_org(snapshot, child)
            .ok_or_else(|| StagingError::NotFound(format!("child organisation `{child}`")))?;

        if !include_restricted {
            if let Some(org) = [&parent_org, &child_org].into_iter().find(|o| o.is_restricted()) {
                return Err(StagingError::Visibility(format!(
                    "`{}` is restricted and restricted organisations are hidden",
                    org.id
                )));
            }
        }

        let exists = snapshot
            .edges()
            .iter()
            .any(|edge| edge.links(parent, child) && !self.is_edge_deleted(edge.original_index));
        let staged = self
            .new_edges
            .iter()
            .any(|edge| edge.parent == parent && edge.child == child);
        if exists || staged {
            return Err(StagingError::Duplicate(format!(
                "relationship {parent} -> {child} already exists"
            )));
        }

        self.new_edges.push(NewEdge {
            parent: parent.to_string(),
            child: child.to_string(),
        });
        tracing::debug!(parent, child, "staged hierarchy addition");
        Ok(())
    }

    pub fn remove_staged_edge(&mut self, index: usize) -> Option<NewEdge> {
        (index < self.new_edges.len()).then(|| self.new_edges.remove(index))
    }

    /// Flips the deletion mark on an original edge. Returns whether the edge
    /// is now marked deleted. Restoring an edge whose pair was staged again
    /// after the deletion is rejected, so each pair stays live at most once.
    pub fn toggle_hierarchy_delete(
        &mut self,
        snapshot: &Snapshot,
        original_index: usize,
    ) -> StagingResult<bool> {
        let edge = snapshot
            .edges()
            .get(original_index)
            .ok_or_else(|| StagingError::NotFound(format!("relationship #{original_index}")))?;
        if !self.deleted_edges.contains(&original_index) {
            self.deleted_edges.insert(original_index);
            return Ok(true);
        }
        if self
            .new_edges
            .iter()
            .any(|staged| edge.links(&staged.parent, &staged.child))
        {
            return Err(StagingError::Duplicate(format!(
                "relationship {} -> {} is already staged as an addition",
                edge.parent(),
                edge.child()
            )));
        }
        self.deleted_edges.remove(&original_index);
        Ok(false)
    }

    pub fn stage_org_edit(
        &mut self,
        org_id: &str,
        name: &str,
        visibility: Visibility,
    ) -> StagingResult<()> {
        let org_id = org_id.trim();
        if org_id.is_empty() {
            return Err(StagingError::Validation(
                "OrganisationID is required".to_string(),
            ));
        }
        self.org_edits.insert(
            org_id.to_string(),
            OrgEdit {
                name: name.to_string(),
                visibility,
            },
        );
        Ok(())
    }

    pub fn unstage_org_edit(&mut self, org_id: &str) -> Option<OrgEdit> {
        self.org_edits.shift_remove(org_id)
    }

    pub fn clear(&mut self) {
        self.new_edges.clear();
        self.deleted_edges.clear();
        self.org_edits.clear();
    }
}

/// Both pending-change domains together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingLedger {
    pub persons: PersonLedger,
    pub orgs: OrgLedger,
}

impl StagingLedger {
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.orgs.is_empty()
    }

    pub fn clear(&mut self) {
        self.persons.clear();
        self.orgs.clear();
    }
}

fn require_person_fields(person: &Row) -> StagingResult<String> {
    let id = person_id(person).trim();
    if id.is_empty() {
        return Err(StagingError::Validation("PersonID is required".to_string()));
    }
    if field(person, columns::EMAIL).trim().is_empty() {
        return Err(StagingError::Validation("Email is required".to_string()));
    }
    Ok(id.to_string())
}

/// Points every staff row at `id`. Rows that name a different person are
/// rejected.
fn attach_staff(id: &str, staff: Vec<Row>) -> StagingResult<Vec<Row>> {
    staff
        .into_iter()
        .map(|mut row| {
            let owner = person_id(&row);
            if !owner.is_empty() && owner != id {
                return Err(StagingError::Validation(format!(
                    "affiliation belongs to `{owner}`, not `{id}`"
                )));
            }
            row.insert(columns::PERSON_ID.to_string(), id.to_string());
            Ok(row)
        })
        .collect()
}

pub fn is_slug(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
