use crate::{
    metadata::{
        tables::{schema::RowCursor, ModuleRaw, RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

impl RowReadable for ModuleRaw {
    fn row_size(sizes: &TableInfoRef) -> u32 {
        TableId::Module.row_size(sizes)
    }

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        let start = *offset;
        let mut columns = RowCursor::new(TableId::Module, data, offset, sizes);

        Ok(ModuleRaw {
            rid,
            token: Token::new(TableId::Module.token_base() | rid),
            offset: start,
            generation: columns.value()?,
            name: columns.value()?,
            mvid: columns.value()?,
            encid: columns.value()?,
            encbaseid: columns.value()?,
        })
    }
}
