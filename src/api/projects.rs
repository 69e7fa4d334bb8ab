//! `GET /api/projects` wire schema.

use serde::{Deserialize, Serialize};

use crate::core::{BeadId, CoreError, Cursor, Page, PageItem};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsResponse {
    pub data: Vec<Project>,
    pub next_id: Option<u32>,
    pub previous_id: Option<u32>,
}

impl ProjectsResponse {
    /// Validate a response fetched at `cursor` into a [`Page`].
    pub fn into_page(self, cursor: Cursor) -> Result<Page, CoreError> {
        let items = self
            .data
            .into_iter()
            .map(|project| {
                Ok(PageItem {
                    id: BeadId::new(i64::from(project.id))?,
                    name: project.name,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;
        Page::new(
            cursor,
            items,
            self.next_id.map(Cursor),
            self.previous_id.map(Cursor),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_camel_case_body() {
        let body = r#"{"data":[{"id":1404,"name":"Project 1404"}],"nextId":null,"previousId":1296}"#;
        let resp: ProjectsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.previous_id, Some(1296));
        let page = resp.into_page(Cursor(1404)).unwrap();
        assert_eq!(page.items().len(), 1);
        assert_eq!(page.next_cursor(), None);
        assert_eq!(page.previous_cursor(), Some(Cursor(1296)));
    }

    #[test]
    fn rejects_out_of_range_item() {
        let resp = ProjectsResponse {
            data: vec![Project {
                id: 5000,
                name: "Project 5000".into(),
            }],
            next_id: None,
            previous_id: None,
        };
        assert!(matches!(
            resp.into_page(Cursor(5000)),
            Err(CoreError::InvalidBeadId(_))
        ));
    }
}
