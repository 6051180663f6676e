use crate::{
    metadata::{
        tables::{schema::RowCursor, RowReadable, TableId, TableInfoRef, TypeRefRaw},
        token::Token,
    },
    Result,
};

impl RowReadable for TypeRefRaw {
    fn row_size(sizes: &TableInfoRef) -> u32 {
        TableId::TypeRef.row_size(sizes)
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        let start = *offset;
        let mut columns = RowCursor::new(TableId::TypeRef, data, offset, sizes);

        Ok(TypeRefRaw {
            rid,
            token: Token::new(TableId::TypeRef.token_base() | rid),
            offset: start,
            resolution_scope: columns.coded()?,
            type_name: columns.value()?,
            type_namespace: columns.value()?,
        })
    }
}
