use crate::param::Accessor;
use classmap_core::schema::{
    app::ClassId,
    db::{ColumnId, TableId},
    mapping::{PropertyMap, SystemProperty},
};

/// One column a property map expands to.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Leaf {
    /// Full access string of the column, e.g. `Address.Loc.X`
    pub access_string: String,

    pub column: ColumnId,

    /// How the column's scalar is reached from the property value
    pub path: Vec<Accessor>,

    pub kind: LeafKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LeafKind {
    Data,
    System(SystemProperty),
    /// `RelECClassId` column of a navigation property through the given
    /// relationship
    NavigationRelClassId(ClassId),
}

/// Which columns of a system property map to expand to. System maps have
/// one column per table the class spans.
#[derive(Debug, Clone, Copy)]
pub(super) enum SystemColumns {
    /// Every table's column. Used when writing.
    All,
    /// The first table's column
    Primary,
    /// The column in the given table, if any
    In(TableId),
}

pub(super) fn leaves(map: &PropertyMap, system: SystemColumns) -> Vec<Leaf> {
    let mut leaves = vec![];
    collect(map, system, &mut leaves);
    leaves
}

fn collect(map: &PropertyMap, system: SystemColumns, leaves: &mut Vec<Leaf>) {
    match map {
        PropertyMap::System(map) => {
            let columns = match system {
                SystemColumns::All => map.columns.clone(),
                SystemColumns::Primary => map.columns.first().copied().into_iter().collect(),
                SystemColumns::In(table) => map.column_in(table).into_iter().collect(),
            };

            for column in columns {
                leaves.push(Leaf {
                    access_string: map.property.as_str().to_string(),
                    column,
                    path: vec![],
                    kind: LeafKind::System(map.property),
                });
            }
        }
        PropertyMap::Primitive(map) if map.ty.is_point() => {
            let coordinates = [
                ("X", Accessor::X),
                ("Y", Accessor::Y),
                ("Z", Accessor::Z),
            ];
            for (column, (name, accessor)) in map.columns.iter().zip(coordinates) {
                leaves.push(Leaf {
                    access_string: format!("{}.{name}", map.access_string),
                    column: *column,
                    path: vec![accessor],
                    kind: LeafKind::Data,
                });
            }
        }
        PropertyMap::Primitive(map) => {
            for column in &map.columns {
                leaves.push(Leaf {
                    access_string: map.access_string.clone(),
                    column: *column,
                    path: vec![],
                    kind: LeafKind::Data,
                });
            }
        }
        PropertyMap::Struct(map) => {
            for member in &map.members {
                let name = member
                    .access_string()
                    .rsplit('.')
                    .next()
                    .unwrap_or_default()
                    .to_string();

                let start = leaves.len();
                collect(member, system, leaves);
                for leaf in &mut leaves[start..] {
                    leaf.path.insert(0, Accessor::Member(name.clone()));
                }
            }
        }
        PropertyMap::Array(map) => leaves.push(Leaf {
            access_string: map.access_string.clone(),
            column: map.column,
            path: vec![Accessor::Json],
            kind: LeafKind::Data,
        }),
        PropertyMap::Navigation(map) => {
            if let Some(id) = map.id {
                leaves.push(Leaf {
                    access_string: format!("{}.Id", map.access_string),
                    column: id,
                    path: vec![Accessor::NavigationId],
                    kind: LeafKind::Data,
                });
            }
            if let Some(rel_class_id) = map.rel_class_id {
                leaves.push(Leaf {
                    access_string: format!("{}.RelECClassId", map.access_string),
                    column: rel_class_id,
                    path: vec![Accessor::NavigationRelClassId],
                    kind: LeafKind::NavigationRelClassId(map.relationship),
                });
            }
        }
    }
}

/// Narrows the leaves of a map to the ones under `path`, which is `depth`
/// segments below the map's own access string. The paths of the kept leaves
/// are made relative to `path`.
pub(super) fn select(leaves: Vec<Leaf>, path: &str, depth: usize) -> Vec<Leaf> {
    if depth == 0 {
        return leaves;
    }

    leaves
        .into_iter()
        .filter(|leaf| is_under(&leaf.access_string, path))
        .map(|mut leaf| {
            leaf.path.drain(..depth.min(leaf.path.len()));
            leaf
        })
        .collect()
}

/// True if `access_string` is `path` or one of its members
pub(super) fn is_under(access_string: &str, path: &str) -> bool {
    access_string.eq_ignore_ascii_case(path)
        || (access_string.len() > path.len()
            && access_string.is_char_boundary(path.len())
            && access_string[..path.len()].eq_ignore_ascii_case(path)
            && access_string.as_bytes()[path.len()] == b'.')
}

/// The part of `access_string` below `path`, empty when they are equal
pub(super) fn relative<'s>(access_string: &'s str, path: &str) -> &'s str {
    if access_string.len() > path.len() && access_string.is_char_boundary(path.len() + 1) {
        &access_string[path.len() + 1..]
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classmap_core::schema::{
        app::PrimitiveType,
        mapping::{ArrayElement, ArrayPropertyMap, PrimitivePropertyMap, StructPropertyMap},
    };
    use pretty_assertions::assert_eq;

    fn column(index: usize) -> ColumnId {
        ColumnId {
            table: TableId(0),
            index,
        }
    }

    fn address() -> PropertyMap {
        StructPropertyMap {
            access_string: "Address".to_string(),
            struct_class: ClassId(9),
            members: vec![
                PrimitivePropertyMap {
                    access_string: "Address.Street".to_string(),
                    ty: PrimitiveType::String,
                    columns: vec![column(1)],
                }
                .into(),
                PrimitivePropertyMap {
                    access_string: "Address.Loc".to_string(),
                    ty: PrimitiveType::Point2d,
                    columns: vec![column(2), column(3)],
                }
                .into(),
                ArrayPropertyMap {
                    access_string: "Address.Tags".to_string(),
                    element: ArrayElement::Primitive(PrimitiveType::String),
                    column: column(4),
                }
                .into(),
            ],
        }
        .into()
    }

    #[test]
    fn struct_leaves_carry_member_paths() {
        let leaves = leaves(&address(), SystemColumns::All);

        let described: Vec<(&str, Vec<Accessor>)> = leaves
            .iter()
            .map(|leaf| (leaf.access_string.as_str(), leaf.path.clone()))
            .collect();

        assert_eq!(
            described,
            vec![
                ("Address.Street", vec![Accessor::Member("Street".into())]),
                (
                    "Address.Loc.X",
                    vec![Accessor::Member("Loc".into()), Accessor::X]
                ),
                (
                    "Address.Loc.Y",
                    vec![Accessor::Member("Loc".into()), Accessor::Y]
                ),
                (
                    "Address.Tags",
                    vec![Accessor::Member("Tags".into()), Accessor::Json]
                ),
            ]
        );
    }

    #[test]
    fn select_coordinate_below_point() {
        let loc = PropertyMap::from(PrimitivePropertyMap {
            access_string: "Loc".to_string(),
            ty: PrimitiveType::Point3d,
            columns: vec![column(1), column(2), column(3)],
        });

        let selected = select(leaves(&loc, SystemColumns::All), "loc.y", 1);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].column, column(2));
        assert!(selected[0].path.is_empty());
    }

    #[test]
    fn prefix_must_end_at_segment_boundary() {
        assert!(is_under("Address.Street", "address"));
        assert!(!is_under("AddressLine", "Address"));
        assert_eq!(relative("Address.Loc.X", "Address"), "Loc.X");
        assert_eq!(relative("Address", "Address"), "");
    }
}
