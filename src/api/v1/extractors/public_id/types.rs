/**
 * Responsibility
 *  - リソースごとの「意味付きID型」を宣言する
 *  - 新しいリソースを追加する時はここに tag と alias を足す
 */
use super::core::{PublicId, ResourceTag};

// listings
pub enum ListingTag {}

impl ResourceTag for ListingTag {
    const NAME: &'static str = "listing";
}

pub type PublicListingId = PublicId<ListingTag>;
