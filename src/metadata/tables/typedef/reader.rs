use crate::{
    metadata::{
        tables::{schema::RowCursor, RowReadable, TableId, TableInfoRef, TypeDefRaw},
        token::Token,
    },
    Result,
};

impl RowReadable for TypeDefRaw {
    fn row_size(sizes: &TableInfoRef) -> u32 {
        TableId::TypeDef.row_size(sizes)
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        let start = *offset;
        let mut columns = RowCursor::new(TableId::TypeDef, data, offset, sizes);

        Ok(TypeDefRaw {
            rid,
            token: Token::new(TableId::TypeDef.token_base() | rid),
            offset: start,
            flags: columns.value()?,
            type_name: columns.value()?,
            type_namespace: columns.value()?,
            extends: columns.coded()?,
            field_list: columns.value()?,
            method_list: columns.value()?,
        })
    }
}
