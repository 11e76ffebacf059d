use crate::domain::entities::ledger::{EditEntry, NewPersonEntry, StagingLedger};
use crate::domain::entities::organisation::{NewEdge, OrgEdit, OrganisationRecord, Visibility};
use crate::domain::entities::photo::PhotoReplacement;
use crate::domain::entities::record::{columns, field};
use crate::domain::entities::snapshot::Snapshot;
use crate::domain::forms::person_id_in_use;
use crate::domain::photos::find_photo;
use crate::errors::{StagingError, StagingResult, StoreResult};
use crate::usecase::ports::archive::ArchiveReader;

/// One editing session: the loaded snapshot plus everything staged against
/// it. Exports take the session mutably, so only one can run at a time.
#[derive(Debug, Clone, Default)]
pub struct StagingSession {
    snapshot: Snapshot,
    ledger: StagingLedger,
    include_restricted: bool,
}

impl StagingSession {
    pub fn new(snapshot: Snapshot, ledger: StagingLedger, include_restricted: bool) -> Self {
        Self {
            snapshot,
            ledger,
            include_restricted,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn ledger(&self) -> &StagingLedger {
        &self.ledger
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut StagingLedger {
        &mut self.ledger
    }

    pub fn include_restricted(&self) -> bool {
        self.include_restricted
    }

    pub fn set_include_restricted(&mut self, include_restricted: bool) {
        self.include_restricted = include_restricted;
    }

    pub fn person_id_in_use(&self, id: &str) -> bool {
        person_id_in_use(&self.snapshot, &self.ledger, id)
    }

    pub fn stage_new_person(
        &mut self,
        entry: NewPersonEntry,
        slot: Option<usize>,
    ) -> StagingResult<usize> {
        let index = self
            .ledger
            .persons
            .stage_new_person(&self.snapshot, entry, slot)?;
        tracing::info!(index, "new person staged");
        Ok(index)
    }

    pub fn stage_edited_person(
        &mut self,
        staged_key: Option<&str>,
        entry: EditEntry,
        photo: Option<PhotoReplacement>,
    ) -> StagingResult<()> {
        let id = entry.id().to_string();
        self.ledger
            .persons
            .stage_edited_person(staged_key, entry, photo)?;
        tracing::info!(person_id = %id, "person edit staged");
        Ok(())
    }

    pub fn unstage_new_person(&mut self, index: usize) -> StagingResult<NewPersonEntry> {
        self.ledger
            .persons
            .unstage_new_person(index)
            .ok_or_else(|| StagingError::NotFound(format!("staged new person #{index}")))
    }

    pub fn unstage_edit(&mut self, id: &str) -> StagingResult<EditEntry> {
        self.ledger
            .persons
            .unstage_edit(id)
            .ok_or_else(|| StagingError::NotFound(format!("staged edit for `{id}`")))
    }

    pub fn stage_hierarchy_add(&mut self, parent: &str, child: &str) -> StagingResult<()> {
        self.ledger.orgs.stage_hierarchy_add(
            &self.snapshot,
            parent,
            child,
            self.include_restricted,
        )?;
        tracing::info!(parent, child, "hierarchy addition staged");
        Ok(())
    }

    pub fn remove_staged_edge(&mut self, index: usize) -> StagingResult<NewEdge> {
        self.ledger
            .orgs
            .remove_staged_edge(index)
            .ok_or_else(|| StagingError::NotFound(format!("staged relationship #{index}")))
    }

    /// Marks or unmarks an original edge for deletion. Returns whether it is
    /// now marked.
    pub fn toggle_hierarchy_delete(&mut self, original_index: usize) -> StagingResult<bool> {
        let deleted = self
            .ledger
            .orgs
            .toggle_hierarchy_delete(&self.snapshot, original_index)?;
        tracing::info!(original_index, deleted, "hierarchy deletion toggled");
        Ok(deleted)
    }

    pub fn stage_org_edit(
        &mut self,
        org_id: &str,
        name: &str,
        visibility: Visibility,
    ) -> StagingResult<()> {
        if !self.snapshot.directory().contains_key(org_id.trim()) {
            return Err(StagingError::NotFound(format!("organisation `{org_id}`")));
        }
        self.ledger.orgs.stage_org_edit(org_id, name, visibility)?;
        tracing::info!(org_id, %visibility, "organisation edit staged");
        Ok(())
    }

    pub fn unstage_org_edit(&mut self, org_id: &str) -> StagingResult<OrgEdit> {
        self.ledger
            .orgs
            .unstage_org_edit(org_id)
            .ok_or_else(|| StagingError::NotFound(format!("staged edit for `{org_id}`")))
    }

    pub fn effective_org(&self, id: &str) -> Option<OrganisationRecord> {
        self.ledger.orgs.effective_org(&self.snapshot, id)
    }

    /// Organisations offered for selection, with staged edits applied.
    /// Restricted ones are left out unless the session includes them.
    pub fn selectable_organisations(&self) -> Vec<OrganisationRecord> {
        self.snapshot
            .directory()
            .keys()
            .filter_map(|id| self.effective_org(id))
            .filter(|org| self.include_restricted || !org.is_restricted())
            .collect()
    }

    /// The `ProfilePhoto` recorded for a loaded person, if any.
    pub fn original_photo(&self, person_id: &str) -> Option<&str> {
        self.snapshot
            .find_person(person_id)
            .map(|row| field(row, columns::PROFILE_PHOTO))
            .filter(|name| !name.is_empty())
    }

    /// Locates a person's current photo in the loaded archive.
    pub fn find_original_photo(
        &self,
        reader: &dyn ArchiveReader,
        name: &str,
    ) -> StoreResult<Option<String>> {
        find_photo(reader, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::record::row_from;
    use crate::domain::entities::snapshot::SheetData;
    use crate::domain::merge::merge_hierarchy;

    fn header(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    fn session() -> StagingSession {
        let organisations = SheetData::new(
            "Organisations",
            header(&["OrganisationID", "Name_en", "Visibility"]),
            vec![
                row_from([("OrganisationID", "a"), ("Name_en", "Alpha"), ("Visibility", "Public")]),
                row_from([("OrganisationID", "b"), ("Name_en", "Beta"), ("Visibility", "Public")]),
                row_from([("OrganisationID", "r"), ("Name_en", "Vault"), ("Visibility", "Restricted")]),
            ],
        );
        let hierarchy = SheetData::new(
            "OrganisationalHierarchy",
            header(&["ParentOrganisationID", "ChildOrganisationID"]),
            vec![row_from([("ParentOrganisationID", "a"), ("ChildOrganisationID", "b")])],
        );
        let snapshot = Snapshot::new(
            SheetData::default(),
            SheetData::default(),
            organisations,
            hierarchy,
        );
        StagingSession::new(snapshot, StagingLedger::default(), false)
    }

    #[test]
    fn restricted_organisations_are_hidden_until_included() {
        let mut session = session();
        assert_eq!(session.selectable_organisations().len(), 2);
        let err = session
            .stage_hierarchy_add("a", "r")
            .expect_err("restricted child should be rejected");
        assert!(matches!(err, StagingError::Visibility(_)));

        session.set_include_restricted(true);
        session
            .stage_hierarchy_add("a", "r")
            .expect("should stage once restricted are included");
        assert_eq!(session.selectable_organisations().len(), 3);
    }

    #[test]
    fn staged_visibility_edit_applies_to_validation() {
        let mut session = session();
        session
            .stage_org_edit("b", "Beta", Visibility::Restricted)
            .expect("should stage org edit");
        let err = session
            .stage_hierarchy_add("b", "a")
            .expect_err("edited-to-restricted parent should be rejected");
        assert!(matches!(err, StagingError::Visibility(_)));
    }

    #[test]
    fn deleted_edge_can_be_added_back() {
        let mut session = session();
        assert!(matches!(
            session.stage_hierarchy_add("a", "b"),
            Err(StagingError::Duplicate(_))
        ));
        assert!(session.toggle_hierarchy_delete(0).expect("edge 0 exists"));
        session
            .stage_hierarchy_add("a", "b")
            .expect("should stage once the original is deleted");
        assert!(matches!(
            session.toggle_hierarchy_delete(5),
            Err(StagingError::NotFound(_))
        ));
    }

    #[test]
    fn restoring_a_deleted_edge_that_was_staged_again_is_rejected() {
        let mut session = session();
        assert!(session.toggle_hierarchy_delete(0).expect("edge 0 exists"));
        session
            .stage_hierarchy_add("a", "b")
            .expect("should stage once the original is deleted");

        assert!(matches!(
            session.toggle_hierarchy_delete(0),
            Err(StagingError::Duplicate(_))
        ));
        let rows = merge_hierarchy(session.snapshot(), &session.ledger().orgs);
        assert_eq!(rows.len(), 1);

        session.remove_staged_edge(0).expect("staged edge exists");
        assert!(!session.toggle_hierarchy_delete(0).expect("edge 0 exists"));
        let rows = merge_hierarchy(session.snapshot(), &session.ledger().orgs);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["ParentOrganisationID"], "a");
    }

    #[test]
    fn org_edit_needs_a_known_organisation() {
        let mut session = session();
        assert!(matches!(
            session.stage_org_edit("zzz", "Nope", Visibility::Public),
            Err(StagingError::NotFound(_))
        ));
        session
            .stage_org_edit("a", "Alpha Faculty", Visibility::Public)
            .expect("should stage org edit");
        assert_eq!(
            session.effective_org("a").map(|org| org.name),
            Some("Alpha Faculty".to_string())
        );
        session.unstage_org_edit("a").expect("edit was staged");
        assert!(session.ledger().is_empty());
    }
}
