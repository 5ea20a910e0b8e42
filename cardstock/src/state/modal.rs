//! Modal store: which overlay dialog is shown, with its payload

use crate::model::Face;

/// Overlay dialogs.
#[derive(Clone, Debug, PartialEq)]
pub enum Modal {
    /// Full metadata view for one image.
    CardDetail { identifier: String },
    /// Bulk version picker for the given members.
    ChangeVersion { targets: Vec<(usize, Face)> },
    /// Review of selections that vanished from their results.
    InvalidIdentifiers,
    /// Search settings editor.
    SettingsEditor,
    /// Decklist text entry.
    ImportText,
}

/// Which overlay is currently shown. At most one at a time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModalState {
    pub open: Option<Modal>,
}

impl ModalState {
    /// Show a modal, replacing any open one.
    pub fn show(&mut self, modal: Modal) -> bool {
        if self.open.as_ref() == Some(&modal) {
            return false;
        }
        self.open = Some(modal);
        true
    }

    /// Hide the open modal.
    pub fn hide(&mut self) -> bool {
        self.open.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_and_hide() {
        let mut state = ModalState::default();

        assert!(state.show(Modal::ImportText));
        assert!(!state.show(Modal::ImportText));
        assert!(state.show(Modal::SettingsEditor));
        assert_eq!(state.open, Some(Modal::SettingsEditor));

        assert!(state.hide());
        assert!(!state.hide());
    }
}
